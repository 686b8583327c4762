use clap::{Parser, Subcommand};
use dotenv::dotenv;
use flowstep::{
    Activity, Decider, EventKind, Flow, FlowConfig, FlowContext, FlowError, FlowEvent,
    RetryableError,
};

use std::sync::Arc;

flowstep::flow_states! {
    enum DemoState { Start, A, B, End }
    start = Start;
    end = End;
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the START -> A -> B -> END demo workflow
    Demo {
        /// Retryable failures tolerated before the run fails
        #[arg(short, long)]
        retry_limit: Option<u32>,

        /// Make ActivityB fail with a retryable error on every attempt
        #[arg(long)]
        fail_at_b: bool,
    },
    /// Run the demo, print its history, then rewind and replay it
    History {
        /// Retryable failures tolerated before the run fails
        #[arg(short, long)]
        retry_limit: Option<u32>,
    },
}

fn build_flow(retry_limit: u32, fail_at_b: bool) -> Flow<DemoState> {
    let activity_a = Arc::new(Activity::from_fn(
        "ActivityA",
        |ctx: &mut FlowContext<DemoState>| {
            println!("Executing ActivityA");
            ctx.set_state(DemoState::B);
            Ok(())
        },
    ));
    let activity_b = Arc::new(Activity::new(
        "ActivityB",
        move |ctx: &mut FlowContext<DemoState>| {
            Box::pin(async move {
                println!("Executing ActivityB");
                if fail_at_b {
                    return Err(FlowError::from(RetryableError::default()));
                }
                ctx.set_state(DemoState::End);
                Ok(())
            })
        },
    ));

    let decider = Decider::new(move |ctx: &FlowContext<DemoState>| match ctx.state() {
        DemoState::Start | DemoState::A => Some(activity_a.clone()),
        DemoState::B => Some(activity_b.clone()),
        DemoState::End => None,
    });

    let mut flow = Flow::new(decider, FlowContext::new()).with_retry_limit(retry_limit);
    flow.on(EventKind::Success, |_event, flow| {
        log::info!("[{}] success", flow.run_id());
    });
    flow.on(EventKind::Failure, |_event, flow| {
        log::warn!(
            "[{}] failure after {} retries",
            flow.run_id(),
            flow.current_retry()
        );
    });
    flow.on(EventKind::Error, |event, flow| {
        if let FlowEvent::Error(err) = event {
            log::error!("[{}] error: {}", flow.run_id(), err);
        }
    });
    flow
}

fn print_outcome(flow: &Flow<DemoState>) {
    println!(
        "Status: {:?}, state: {:?}, retries: {}, history: {}",
        flow.status(),
        flow.context().state(),
        flow.current_retry(),
        flow.history().len()
    );
    if let Some(err) = flow.last_error() {
        println!("Last error: {}", err);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let config = FlowConfig::from_env()?;

    match args.command {
        Commands::Demo {
            retry_limit,
            fail_at_b,
        } => {
            let retry_limit = retry_limit.unwrap_or(config.retry_limit);
            log::info!("Running demo with retry limit {}", retry_limit);

            let mut flow = build_flow(retry_limit, fail_at_b);
            flow.start(None).await;
            print_outcome(&flow);
        }
        Commands::History { retry_limit } => {
            let retry_limit = retry_limit.unwrap_or(config.retry_limit);
            let mut flow = build_flow(retry_limit, false);
            flow.start(None).await;

            for (i, record) in flow.history().iter().enumerate() {
                println!(
                    "Step {}: {:?} (retries: {}, recorded at {})",
                    i + 1,
                    record.state(),
                    record.retry_count,
                    record.recorded_at.to_rfc3339()
                );
            }

            println!("Stepping backward over the whole history");
            flow.backward(None).await;
            print_outcome(&flow);

            println!("Resetting to step 2 and finishing");
            flow.reset_to(2);
            flow.start(None).await;
            print_outcome(&flow);

            println!("Replaying");
            flow.replay().await;
            print_outcome(&flow);
        }
    }

    Ok(())
}
