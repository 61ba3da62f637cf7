use std::{
    fs::File,
    io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use predictor_tui::{
    app::{Action, App, Message},
    catalog::Catalog,
    data::{DataClient, PredictionService},
    flags, ui,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Base address of the prediction service
    #[arg(long, env = "PREDICTOR_BASE_URL", default_value = "http://localhost:8000")]
    base_url: String,

    /// Request timeout in seconds
    #[arg(short, long, default_value_t = 10)]
    timeout: u64,

    /// Directory holding teams.json, all_cities.json, all_countries.json
    /// and all_tournaments.json (bundled lists are used otherwise)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Where log lines go; the terminal is taken by the UI
    #[arg(long, default_value = "predictor.log")]
    log_file: PathBuf,

    /// Do not download flag images
    #[arg(long)]
    no_flags: bool,
}

fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_file)?;

    let catalog = match &args.data_dir {
        Some(dir) => Catalog::load_dir(dir)?,
        None => Catalog::bundled()?,
    };
    let client = Arc::new(DataClient::new(&args.base_url, Duration::from_secs(args.timeout))?);
    info!(base_url = client.base_url(), teams = catalog.teams().len(), "starting");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(Arc::new(catalog), !args.no_flags);

    // Background tasks report back on this channel
    let (tx, mut rx) = mpsc::channel::<Message>(100);
    let spawner = Spawner {
        client,
        flag_client: reqwest::Client::new(),
        tx,
    };

    let res = run_app(&mut terminal, &mut app, &spawner, &mut rx).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{:?}", err)
    }
    info!("bye");

    Ok(())
}

struct Spawner<S> {
    client: Arc<S>,
    flag_client: reqwest::Client,
    tx: mpsc::Sender<Message>,
}

impl<S: PredictionService + Send + Sync + 'static> Spawner<S> {
    fn spawn(&self, action: Action) {
        let tx = self.tx.clone();
        match action {
            Action::Predict(pending) => {
                let client = self.client.clone();
                tokio::spawn(async move {
                    let result = client.predict(&pending.request).await;
                    let _ = tx
                        .send(Message::Prediction {
                            ticket: pending.ticket,
                            result,
                        })
                        .await;
                });
            }
            Action::FetchPredictions => {
                let client = self.client.clone();
                tokio::spawn(async move {
                    let result = client.fetch_predictions().await;
                    let _ = tx.send(Message::Predictions(result)).await;
                });
            }
            Action::FetchFlags(codes) => {
                let flag_client = self.flag_client.clone();
                tokio::spawn(async move {
                    for code in codes {
                        match flags::fetch_flag(&flag_client, &code).await {
                            Ok(image) => {
                                let _ = tx.send(Message::Flag { code, image }).await;
                            }
                            Err(err) => warn!(%code, "flag unavailable: {err:#}"),
                        }
                    }
                });
            }
        }
    }
}

async fn run_app<B: Backend, S: PredictionService + Send + Sync + 'static>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    spawner: &Spawner<S>,
    rx: &mut mpsc::Receiver<Message>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui::ui(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    for action in app.on_key(key.code) {
                        spawner.spawn(action);
                    }
                }
            }
        }

        while let Ok(message) = rx.try_recv() {
            for action in app.apply(message) {
                spawner.spawn(action);
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
