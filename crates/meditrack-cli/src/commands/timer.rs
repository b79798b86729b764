use clap::Subcommand;
use meditrack_core::storage::Database;
use meditrack_core::timer::{format_hhmmss, Ticker, TokioTicker};
use meditrack_core::{Event, SessionSaver, SystemClock, TimerController, TimerEngine, TimerStatus};

const ENGINE_KEY: &str = "timer_engine";

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a meditation session
    Start,
    /// Pause the running session
    Pause,
    /// Resume a paused session
    Resume,
    /// Stop the session, save it to the backend and reset
    Stop,
    /// Print current timer state as JSON
    Status,
    /// Print the elapsed time every second until interrupted
    Watch {
        /// Stop after this many ticks
        #[arg(long)]
        ticks: Option<u64>,
    },
}

fn load_engine(db: &Database) -> TimerEngine {
    match db.kv_get(ENGINE_KEY) {
        Ok(Some(json)) => match serde_json::from_str::<TimerEngine>(&json) {
            Ok(engine) => engine,
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable timer state");
                TimerEngine::new()
            }
        },
        Ok(None) => TimerEngine::new(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to read timer state");
            TimerEngine::new()
        }
    }
}

fn save_engine(db: &Database, engine: &TimerEngine) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string(engine)?;
    db.kv_set(ENGINE_KEY, &json)?;
    Ok(())
}

fn print_event(event: &Event) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(event)?);
    Ok(())
}

pub async fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let db = Database::open()?;
    let (ticker, ticks) = TokioTicker::new();
    let mut timer = TimerController::with_engine(load_engine(&db), SystemClock, ticker)
        .with_save_status_clear(config.client.save_status_clear());

    match action {
        TimerAction::Start => match timer.start() {
            Some(event) => print_event(&event)?,
            None => print_event(&timer.snapshot())?,
        },
        TimerAction::Pause => match timer.pause() {
            Some(event) => print_event(&event)?,
            None => print_event(&timer.snapshot())?,
        },
        TimerAction::Resume => match timer.resume() {
            Some(event) => print_event(&event)?,
            None => print_event(&timer.snapshot())?,
        },
        TimerAction::Stop => {
            let saver = SessionSaver::new(super::token_store(), super::api_client(&config)?);
            match timer.stop(&saver).await {
                Some(event) => print_event(&event)?,
                None => print_event(&timer.snapshot())?,
            }
        }
        TimerAction::Status => {
            timer.tick();
            print_event(&timer.snapshot())?;
        }
        TimerAction::Watch { ticks: limit } => {
            watch(&mut timer, ticks, limit).await?;
        }
    }

    save_engine(&db, timer.engine())?;
    Ok(())
}

async fn watch<K: Ticker>(
    timer: &mut TimerController<SystemClock, K>,
    mut ticks: tokio::sync::mpsc::UnboundedReceiver<()>,
    limit: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", format_hhmmss(timer.display_secs() as i64));
    if timer.status() != TimerStatus::Running {
        return Ok(());
    }

    let mut seen = 0u64;
    loop {
        tokio::select! {
            tick = ticks.recv() => {
                if tick.is_none() {
                    break;
                }
                timer.tick();
                println!("{}", format_hhmmss(timer.display_secs() as i64));
                seen += 1;
                if limit.is_some_and(|limit| seen >= limit) {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}
