use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use bob::audio::alert::RodioBeeper;
use bob::audio::capture::AudioCapture;
use bob::audio::listener::{ConsoleListener, MicrophoneListener, SpeechInput};
use bob::audio::processing::UtteranceSegmenter;
use bob::config::AssistantConfig;
use bob::handlers::{AppCatalog, AppLauncher, Capabilities, Conversation, MediaPlayer, WeatherReporter};
use bob::kernel::scheduler::AlarmRegistry;
use bob::kernel::ticker::Ticker;
use bob::kernel::time::SystemClock;
use bob::kernel::timeparse::NaturalTimeParser;
use bob::outputs::{CommandSpeaker, ConsoleSpeaker, SpeechOutput};
use bob::services::browser::{BrowserDriver, WebDriverBrowser};
use bob::services::launcher::SystemLauncher;
use bob::services::llm::OpenAiChatClient;
use bob::services::stt::Transcriber;
use bob::services::weather::{NominatimGeocoder, OpenWeatherClient};
use bob::{Dispatcher, DispatcherSettings};
use clap::Parser;
use ringbuf::traits::Split;
use ringbuf::HeapRb;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Bob, a wake-word voice assistant.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Type queries on stdin and print replies instead of using the mic and TTS.
    #[arg(long)]
    console: bool,

    /// Read settings from this file instead of ./.env
    #[arg(long, value_name = "PATH")]
    env_file: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    tracing::info!("Bob booting...");

    let runtime = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
    let result = runtime.block_on(run(args));
    // A pending stdin or microphone read must not hold the process open.
    runtime.shutdown_timeout(Duration::from_secs(2));
    result
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = AssistantConfig::load(args.env_file.as_deref()).context("loading configuration")?;
    if config.llm.api_key.is_none() {
        tracing::warn!("LLM_API_KEY is not set; conversation will apologise instead of answering");
    }

    let shutdown = CancellationToken::new();

    // Microphone stream; must outlive the dispatcher.
    let mut _capture: Option<AudioCapture> = None;

    let (input, output): (Arc<dyn SpeechInput>, Arc<dyn SpeechOutput>) = if args.console {
        (Arc::new(ConsoleListener::stdin()), Arc::new(ConsoleSpeaker::new()))
    } else {
        let (producer, consumer) = HeapRb::<f32>::new(96_000).split();
        let capture = AudioCapture::new(producer).context("opening microphone")?;
        let segmenter = UtteranceSegmenter::new(consumer, capture.sample_rate).with_shutdown(shutdown.clone());
        _capture = Some(capture);
        let speaker = CommandSpeaker::new(&config.tts).context("configuring text-to-speech")?;
        (
            Arc::new(MicrophoneListener::new(segmenter, Transcriber::new(&config.stt))),
            Arc::new(speaker),
        )
    };

    let registry = Arc::new(AlarmRegistry::new(Arc::new(SystemClock)));
    let browser: Arc<dyn BrowserDriver> = Arc::new(WebDriverBrowser::new(&config.browser));

    let mut catalog = AppCatalog::default();
    catalog.extend(config.apps.iter().cloned());

    let capabilities = Capabilities {
        apps: AppLauncher::new(catalog, Arc::new(SystemLauncher)),
        media: MediaPlayer::new(Arc::clone(&browser)),
        weather: WeatherReporter::new(
            Arc::new(NominatimGeocoder::new(&config.weather)),
            Arc::new(OpenWeatherClient::new(&config.weather)),
            config.weather.location.clone(),
        ),
        conversation: Conversation::new(Arc::new(OpenAiChatClient::new(&config.llm))),
        registry: Arc::clone(&registry),
        time_parser: Arc::new(NaturalTimeParser),
    };

    let ticker = Ticker::new(Arc::clone(&registry), Arc::new(RodioBeeper::new()), Arc::clone(&output))
        .spawn(shutdown.clone());

    let ctrl_c_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, shutting down");
            ctrl_c_token.cancel();
        }
    });

    let dispatcher = Dispatcher::new(input, output, capabilities, DispatcherSettings::from(&config));
    dispatcher.run(shutdown.clone()).await;

    shutdown.cancel();
    if let Err(e) = ticker.await {
        tracing::warn!("Ticker task ended abnormally: {}", e);
    }
    if let Err(e) = browser.close().await {
        tracing::warn!("Browser cleanup failed: {}", e);
    }

    tracing::info!("Goodbye.");
    Ok(())
}
