use anyhow::{anyhow, Result};
use clap::{Arg, Command};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use anuvadya::config::Config;
use anuvadya::search::{SceneSearcher, SearchRequest};
use anuvadya::services::{FingerprintClient, SubtitleGenerator};
use anuvadya::session::SessionManager;
use anuvadya::subtitle::{format_srt, format_vtt, SubtitleTrack};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("anuvadya=info,warn")),
        )
        .init();

    let matches = Command::new("anuvadya")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Subtitle generation, conversion, and scene search for translated video")
        .subcommand_required(true)
        .subcommand(
            Command::new("serve")
                .about("Start the scene-search API server")
                .arg(
                    Arg::new("port")
                        .short('p')
                        .long("port")
                        .value_name("PORT")
                        .help("Listen port (overrides configuration)"),
                ),
        )
        .subcommand(
            Command::new("generate")
                .about("Generate subtitles for a media file via the backend service")
                .arg(Arg::new("file").short('f').long("file").value_name("FILE").required(true))
                .arg(
                    Arg::new("target-language")
                        .short('l')
                        .long("target-language")
                        .value_name("CODE")
                        .default_value("en"),
                )
                .arg(Arg::new("translate-to").long("translate-to").value_name("CODE"))
                .arg(Arg::new("output").short('o').long("output").value_name("FILE")),
        )
        .subcommand(
            Command::new("convert")
                .about("Convert a subtitle file between SRT and WebVTT")
                .arg(Arg::new("input").short('i').long("input").value_name("FILE").required(true))
                .arg(
                    Arg::new("format")
                        .short('t')
                        .long("format")
                        .value_name("FORMAT")
                        .value_parser(["srt", "vtt"])
                        .required(true),
                )
                .arg(Arg::new("output").short('o').long("output").value_name("FILE")),
        )
        .subcommand(
            Command::new("search")
                .about("Search a subtitle file for a scene described in natural language")
                .arg(
                    Arg::new("subtitles")
                        .short('s')
                        .long("subtitles")
                        .value_name("FILE")
                        .required(true),
                )
                .arg(Arg::new("query").short('q').long("query").value_name("TEXT").required(true))
                .arg(Arg::new("duration").long("duration").value_name("SECONDS"))
                .arg(Arg::new("language").long("language").value_name("CODE").default_value("en")),
        )
        .subcommand(
            Command::new("verify")
                .about("Check a video against the fingerprint database (production role)")
                .arg(Arg::new("file").short('f').long("file").value_name("FILE").required(true))
                .arg(
                    Arg::new("session")
                        .long("session")
                        .value_name("FILE")
                        .help("File containing the auth cookie value")
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("ingest")
                .about("Register a reference title in the fingerprint database (production role)")
                .arg(Arg::new("file").short('f').long("file").value_name("FILE").required(true))
                .arg(Arg::new("title").long("title").value_name("TITLE").required(true))
                .arg(
                    Arg::new("session")
                        .long("session")
                        .value_name("FILE")
                        .required(true),
                ),
        )
        .get_matches();

    let mut config = Config::load().unwrap_or_else(|e| {
        warn!("Failed to load config, using defaults: {}", e);
        Config::default()
    });
    config.validate()?;

    match matches.subcommand() {
        Some(("serve", sub)) => {
            if let Some(port) = sub.get_one::<String>("port") {
                config.server.port = port.parse()?;
            }
            anuvadya::api::start_http_server(Arc::new(config)).await
        }
        Some(("generate", sub)) => {
            let file = PathBuf::from(sub.get_one::<String>("file").unwrap());
            let target_language = sub.get_one::<String>("target-language").unwrap();
            let translate_to = sub.get_one::<String>("translate-to").map(String::as_str);
            let output = sub
                .get_one::<String>("output")
                .map(PathBuf::from)
                .unwrap_or_else(|| file.with_extension("srt"));

            let generator = SubtitleGenerator::new(&config.generation)?;
            let srt = generator.generate(&file, target_language, translate_to).await?;
            tokio::fs::write(&output, &srt).await?;
            info!("Wrote {} cues to {}", SubtitleTrack::parse(&srt).len(), output.display());
            Ok(())
        }
        Some(("convert", sub)) => {
            let input = PathBuf::from(sub.get_one::<String>("input").unwrap());
            let format = sub.get_one::<String>("format").unwrap();
            let output = sub
                .get_one::<String>("output")
                .map(PathBuf::from)
                .unwrap_or_else(|| input.with_extension(format));

            let text = tokio::fs::read_to_string(&input).await?;
            let track = SubtitleTrack::parse(&text);
            if track.is_empty() {
                return Err(anyhow!("no parseable cues in {}", input.display()));
            }
            let converted = match format.as_str() {
                "vtt" => format_vtt(track.cues()),
                _ => format_srt(track.cues()),
            };
            tokio::fs::write(&output, converted).await?;
            info!("Converted {} cues to {}", track.len(), output.display());
            Ok(())
        }
        Some(("search", sub)) => {
            let path = PathBuf::from(sub.get_one::<String>("subtitles").unwrap());
            let query = sub.get_one::<String>("query").unwrap().clone();
            let language = sub.get_one::<String>("language").unwrap().clone();

            let text = tokio::fs::read_to_string(&path).await?;
            let track = SubtitleTrack::parse(&text);
            let video_duration = match sub.get_one::<String>("duration") {
                Some(d) => d.parse()?,
                None => track.total_duration(),
            };

            let searcher = SceneSearcher::from_config(&config.search);
            let request = SearchRequest {
                query,
                subtitles: track.cues().to_vec(),
                video_duration,
                target_language: language,
            };
            let matches = searcher.search(&request).await?;
            println!("{}", serde_json::to_string_pretty(&matches)?);
            Ok(())
        }
        Some(("verify", sub)) => {
            let file = PathBuf::from(sub.get_one::<String>("file").unwrap());
            let session = load_session(&config, sub.get_one::<String>("session").unwrap()).await?;

            let client = FingerprintClient::new(&config.fingerprint)?;
            let report = client.query(&session, &file).await?;
            if report.match_found {
                info!(
                    "Match found: {} (similarity {:.2})",
                    report.title.as_deref().unwrap_or("unknown title"),
                    report.similarity_ratio.unwrap_or(0.0)
                );
            } else {
                info!("No match: {}", report.message);
            }
            println!("{}", serde_json::to_string_pretty(&serde_json::json!({
                "match_found": report.match_found,
                "message": report.message,
                "matched_video_id": report.matched_video_id,
                "title": report.title,
                "similarity_ratio": report.similarity_ratio,
            }))?);
            Ok(())
        }
        Some(("ingest", sub)) => {
            let file = PathBuf::from(sub.get_one::<String>("file").unwrap());
            let title = sub.get_one::<String>("title").unwrap();
            let session = load_session(&config, sub.get_one::<String>("session").unwrap()).await?;

            let client = FingerprintClient::new(&config.fingerprint)?;
            let receipt = client.ingest(&session, &file, title).await?;
            info!(
                "Ingested {} as {} ({:.1}s, {} audio / {} visual hashes)",
                title, receipt.video_id, receipt.duration, receipt.audio_hashes, receipt.visual_hashes
            );
            Ok(())
        }
        _ => unreachable!("subcommand required"),
    }
}

async fn load_session(config: &Config, path: &str) -> Result<anuvadya::session::Session> {
    let cookie = tokio::fs::read_to_string(Path::new(path)).await?;
    let manager = SessionManager::new(config.session.clone());
    let session = manager.decode(cookie.trim())?;
    if manager.needs_refresh(&session) {
        warn!("session token is close to expiry; refresh it before long operations");
    }
    Ok(session)
}
