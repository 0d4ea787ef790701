use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use dqn_trader::{
    agent::learn::QLearningConfig,
    api::{self, AppState},
    config::Config,
    constants::{
        api::BIND_ADDR,
        env::STARTING_CASH,
        files::{DATA_PATH, WEIGHTS_PATH},
        training::TRAIN_SPLIT,
    },
    data::{CachedMarketData, YahooFinance},
    pipeline::{self, BarRange},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dqn_trader", version, about = "Trains a trading agent on daily bars")]
struct Cli {
    #[command(flatten)]
    shared: SharedArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct SharedArgs {
    #[arg(long, global = true, env = "DQN_WEIGHTS_DIR", default_value = WEIGHTS_PATH)]
    weights_dir: PathBuf,

    /// Where downloaded bars are cached
    #[arg(long, global = true, env = "DQN_DATA_DIR", default_value = DATA_PATH)]
    data_dir: PathBuf,

    #[arg(long, global = true, env = "DQN_STARTING_CASH", default_value_t = STARTING_CASH)]
    starting_cash: f64,

    /// Share of the bars, oldest first, used for training
    #[arg(long, global = true, env = "DQN_TRAIN_SPLIT", default_value_t = TRAIN_SPLIT)]
    train_split: f64,

    /// Keep a report of every training episode here
    #[arg(long, global = true, env = "DQN_HISTORY_DIR")]
    history_dir: Option<PathBuf>,

    /// Update the weights with Q-learning while training
    #[arg(long, global = true, env = "DQN_LEARN")]
    learn: bool,

    /// Passes over the training bars when learning
    #[arg(long, global = true, default_value_t = 1, requires = "learn")]
    episodes: usize,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the training service
    Serve {
        #[arg(long, env = "DQN_BIND", default_value = BIND_ADDR)]
        bind: String,
    },
    /// Train once from the terminal
    Train {
        #[arg(long)]
        symbol: String,
        /// YYYY-MM-DD, inclusive
        #[arg(long)]
        start: String,
        /// YYYY-MM-DD, exclusive
        #[arg(long)]
        end: String,
    },
}

impl SharedArgs {
    fn config(&self) -> anyhow::Result<Config> {
        anyhow::ensure!(
            self.starting_cash > 0.,
            "starting cash must be positive, got {}",
            self.starting_cash
        );
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.train_split),
            "train split must be within 0 and 1, got {}",
            self.train_split
        );

        Ok(Config {
            weights_dir: self.weights_dir.clone(),
            data_dir: self.data_dir.clone(),
            starting_cash: self.starting_cash,
            train_split: self.train_split,
            learning: self.learn.then(|| QLearningConfig {
                episodes: self.episodes,
                ..Default::default()
            }),
            history_dir: self.history_dir.clone(),
            ..Default::default()
        })
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging();

    let mut config = cli.shared.config()?;
    let market_data = CachedMarketData::new(YahooFinance::new()?, &config.data_dir);

    println!("{}", "Start".green());

    match cli.command {
        Command::Serve { bind } => {
            config.bind = bind.clone();
            api::serve(AppState::new(config, market_data), &bind)
                .await
                .with_context(|| format!("service on {bind} stopped"))?;
        }
        Command::Train { symbol, start, end } => {
            let job = BarRange::parse(&symbol, &start, &end)?;
            let summary = pipeline::run(&config, &market_data, job)
                .await
                .with_context(|| format!("training on {symbol} failed"))?;

            info!(
                ticker = %summary.ticker,
                train_bars = summary.train_bars,
                eval_bars = summary.eval_bars,
                weights = %summary.weights_path.display(),
                "saved weights"
            );
            println!(
                "{} steps, final reward {}",
                summary.training.steps,
                format!("{:.2}", summary.training.final_reward).bold()
            );
            if let Some(evaluation) = &summary.evaluation {
                let reward = format!("{:.2}", evaluation.final_reward);
                let reward = if evaluation.final_reward >= 0. { reward.green() } else { reward.red() };
                println!("evaluation: {} steps, final reward {reward}", evaluation.steps);
            }
        }
    }

    println!("{}", "End".green());
    Ok(())
}
