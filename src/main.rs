use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use vocal_assistant::voice::{
    AudioCapture, AudioPlayback, ConsoleOutput, LineInput, MicrophoneInput, PLAYBACK_SAMPLE_RATE,
    SpeechOutput, SpeechToText, TextToSpeech, VoiceInput, VoiceOutput, calculate_energy,
};
use vocal_assistant::{Assistant, CompletionClient, Config};

/// Vocal - ask a question out loud, hear the answer
#[derive(Parser)]
#[command(name = "vocal", version, about)]
struct Cli {
    /// Use the keyboard and the terminal instead of microphone and speakers
    #[arg(long, env = "VOCAL_NO_VOICE")]
    no_voice: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Ask one question, print and speak the answer
    Ask {
        /// The question
        question: String,
    },
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output
    TestSpeaker,
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "Bonjour ! Ceci est un test de la synthèse vocale.")]
        text: String,
    },
}

/// One line typed at the prompt
#[derive(Debug, PartialEq, Eq)]
enum Action<'a> {
    /// Listen for a spoken question and answer it
    Ask,
    /// Re-send the current question
    Again,
    /// Stop reading the answer
    Stop,
    /// Answer a typed question
    Type(&'a str),
    Help,
    Quit,
    Nothing,
    Unknown(&'a str),
}

fn parse_action(line: &str) -> Action<'_> {
    let line = line.trim();
    let (command, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(c, r)| (c, r.trim()));

    match command.to_lowercase().as_str() {
        "" => Action::Nothing,
        "ask" | "a" => Action::Ask,
        "again" | "r" => Action::Again,
        "stop" | "s" => Action::Stop,
        "type" | "t" => Action::Type(rest),
        "help" | "?" => Action::Help,
        "quit" | "exit" | "q" => Action::Quit,
        _ => Action::Unknown(command),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn,vocal_assistant=info",
        1 => "info,vocal_assistant=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load_with_options(cli.no_voice);
    tracing::debug!(?config, "loaded configuration");

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::Ask { question } => ask_once(&config, &question).await,
            Command::TestMic { duration } => test_mic(duration).await,
            Command::TestSpeaker => test_speaker().await,
            Command::TestTts { text } => test_tts(&config, &text).await,
        };
    }

    let console = Arc::new(LineInput::new());
    let assistant = build_assistant(&config, Arc::clone(&console))?;
    run_prompt(&assistant, &console).await;

    Ok(())
}

/// Wire the completion client to microphone/speakers or to the terminal
fn build_assistant(config: &Config, console: Arc<LineInput>) -> anyhow::Result<Assistant> {
    let client = CompletionClient::new(&config.completion, config.api_key.as_ref())?;

    let (input, output) = if config.voice.enabled {
        let stt = SpeechToText::new(&config.voice, config.api_key.as_ref())?;
        let tts = TextToSpeech::new(&config.voice, config.api_key.as_ref())?;
        (
            Arc::new(MicrophoneInput::new(stt, config.voice.max_listen)) as Arc<dyn VoiceInput>,
            Arc::new(SpeechOutput::new(tts)) as Arc<dyn VoiceOutput>,
        )
    } else {
        (
            console as Arc<dyn VoiceInput>,
            Arc::new(ConsoleOutput) as Arc<dyn VoiceOutput>,
        )
    };

    tracing::info!(
        model = client.model(),
        voice = config.voice.enabled,
        "assistant ready"
    );

    Ok(Assistant::new(
        client,
        input,
        output,
        config.voice.listen_prompt.clone(),
    ))
}

/// Interactive loop: one action per line until `quit` or end of input
async fn run_prompt(assistant: &Assistant, console: &LineInput) {
    // Answers land asynchronously; print each as it arrives
    let mut answers = assistant.subscribe();
    tokio::spawn(async move {
        while answers.changed().await.is_ok() {
            let answer = answers.borrow_and_update().clone();
            println!("\nRéponse : {answer}");
        }
    });

    print_help();

    loop {
        print!("> ");
        let _ = std::io::stdout().flush();

        let Some(line) = console.next_line().await else {
            break;
        };

        match parse_action(&line) {
            Action::Ask => {
                println!("{}", assistant.listen_prompt());
                if let Some(question) = assistant.listen().await {
                    println!("Votre question : {question}");
                    drop(assistant.spawn_completion(question));
                }
            }
            Action::Again => {
                let question = assistant.question();
                if question.is_empty() {
                    println!("Aucune question pour l'instant.");
                } else {
                    drop(assistant.spawn_completion(question));
                }
            }
            Action::Stop => assistant.stop_reading(),
            Action::Type(text) => {
                if text.is_empty() {
                    println!("usage: type <question>");
                } else if let Some(answer) = assistant.ask_text(text).await {
                    tracing::debug!(answer = %answer, "typed question answered");
                }
            }
            Action::Help => print_help(),
            Action::Quit => break,
            Action::Nothing => {}
            Action::Unknown(cmd) => println!("unknown command: {cmd} (try `help`)"),
        }
    }

    assistant.stop_reading();
}

fn print_help() {
    println!("Assistant vocal");
    println!("  ask           poser une question à voix haute");
    println!("  again         obtenir une nouvelle réponse");
    println!("  stop          arrêter la lecture");
    println!("  type <texte>  poser une question au clavier");
    println!("  quit          quitter");
}

/// Ask a single question from the command line
///
/// The answer is printed and, with voice enabled, read aloud before
/// returning. Speech failures are logged; the answer was already shown.
async fn ask_once(config: &Config, question: &str) -> anyhow::Result<()> {
    let client = CompletionClient::new(&config.completion, config.api_key.as_ref())?;
    let assistant = Assistant::new(
        client,
        Arc::new(LineInput::new()),
        Arc::new(ConsoleOutput),
        config.voice.listen_prompt.clone(),
    );

    let Some(answer) = assistant.ask_text(question).await else {
        println!("usage: vocal ask <question>");
        return Ok(());
    };
    println!("{answer}");

    if config.voice.enabled {
        read_aloud(config, answer.as_str()).await;
    }

    Ok(())
}

/// Synthesize `text` and play it to the end
async fn read_aloud(config: &Config, text: &str) {
    let tts = match TextToSpeech::new(&config.voice, config.api_key.as_ref()) {
        Ok(tts) => tts,
        Err(e) => {
            tracing::warn!(error = %e, "speech output unavailable");
            return;
        }
    };

    let audio = match tts.synthesize(text).await {
        Ok(audio) => audio,
        Err(e) => {
            tracing::warn!(error = %e, "speech synthesis failed");
            return;
        }
    };

    let played = tokio::task::spawn_blocking(move || {
        AudioPlayback::new()?.play_mp3_blocking(&audio, || false)
    })
    .await;

    match played {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => tracing::warn!(error = %e, "speech playback failed"),
        Err(e) => tracing::error!(error = %e, "speech playback task panicked"),
    }
}

/// Test microphone input
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
        let mut capture = AudioCapture::new()?;
        capture.start()?;

        for i in 0..duration {
            std::thread::sleep(Duration::from_secs(1));

            let samples = capture.take_buffer();
            let energy = calculate_energy(&samples);
            let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);

            // Visual meter
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let meter_len = (energy * 100.0).min(50.0) as usize;
            let meter = "█".repeat(meter_len) + &" ".repeat(50 - meter_len);

            println!("[{:2}s] RMS: {energy:.4} | Peak: {peak:.4} | [{meter}]", i + 1);
        }

        capture.stop();
        Ok(())
    })
    .await??;

    println!("\n---");
    println!("If you saw movement in the meter, your mic is working!");

    Ok(())
}

/// Test speaker output with a sine wave
async fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let frequency = 440.0_f32;
    #[allow(clippy::cast_precision_loss)]
    let rate = PLAYBACK_SAMPLE_RATE as f32;
    let num_samples = PLAYBACK_SAMPLE_RATE as usize * 2;

    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f32 / rate;
            (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3 // 30% volume
        })
        .collect();

    tokio::task::spawn_blocking(move || AudioPlayback::new()?.play_blocking(samples, || false))
        .await??;

    println!("\n---");
    println!("If you heard the tone, your speakers are working!");

    Ok(())
}

/// Test TTS output
async fn test_tts(config: &Config, text: &str) -> anyhow::Result<()> {
    println!("Testing TTS with text: \"{text}\"\n");

    let tts = TextToSpeech::new(&config.voice, config.api_key.as_ref())?;

    println!("Synthesizing speech...");
    let mp3_data = tts.synthesize(text).await?;
    println!("Got {} bytes of audio data", mp3_data.len());

    println!("Playing audio...");
    tokio::task::spawn_blocking(move || {
        AudioPlayback::new()?.play_mp3_blocking(&mp3_data, || false)
    })
    .await??;

    println!("\n---");
    println!("If you heard the speech, TTS is working!");

    Ok(())
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;
    use vocal_assistant::config::{CompletionConfig, VoiceConfig};

    use super::*;

    fn config_for(base_url: String) -> Config {
        Config {
            completion: CompletionConfig {
                base_url,
                ..CompletionConfig::default()
            },
            voice: VoiceConfig {
                enabled: false,
                ..VoiceConfig::default()
            },
            api_key: Some(SecretString::from("test-key".to_string())),
        }
    }

    #[tokio::test]
    async fn test_empty_one_shot_question_sends_nothing() {
        let listener = std::net::TcpListener::bind(("127.0.0.1", 0)).unwrap();
        listener.set_nonblocking(true).unwrap();
        let config = config_for(format!("http://{}/", listener.local_addr().unwrap()));

        ask_once(&config, "").await.unwrap();
        ask_once(&config, "   ").await.unwrap();

        let accepted = listener.accept();
        assert!(matches!(
            accepted,
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock
        ));
    }

    #[tokio::test]
    async fn test_one_shot_speech_failure_is_not_fatal() {
        let listener = std::net::TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let unreachable = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let mut config = config_for(format!("{unreachable}/"));
        config.voice.enabled = true;
        config.voice.base_url = unreachable;

        assert!(ask_once(&config, "Capitale de la France ?").await.is_ok());
    }

    #[test]
    fn test_parse_action() {
        assert_eq!(parse_action("ask"), Action::Ask);
        assert_eq!(parse_action("  AGAIN "), Action::Again);
        assert_eq!(parse_action("s"), Action::Stop);
        assert_eq!(parse_action(""), Action::Nothing);
        assert_eq!(parse_action("quit"), Action::Quit);
        assert_eq!(parse_action("dance"), Action::Unknown("dance"));
    }

    #[test]
    fn test_parse_typed_question() {
        assert_eq!(
            parse_action("type  Quelle est la capitale de la France ?"),
            Action::Type("Quelle est la capitale de la France ?")
        );
        assert_eq!(parse_action("type"), Action::Type(""));
    }
}
