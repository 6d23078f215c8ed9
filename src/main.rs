use ai_movie_studio::config::Config;
use ai_movie_studio::generator::{MovieOutcome, Studio};
use ai_movie_studio::request::MovieRequest;
use ai_movie_studio::{init, script};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "movie-studio", version, about = "Generate short AI movies from a prompt")]
struct Cli {
    /// Path to the JSON config file.
    #[arg(long, global = true, default_value = "config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Clone)]
struct RequestArgs {
    #[arg(long, default_value = "Untitled Movie")]
    title: String,
    #[arg(long, default_value = "Action")]
    genre: String,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long, default_value = "Cinematic")]
    style: String,
    #[arg(long, default_value_t = 5)]
    num_scenes: u32,
}

impl From<RequestArgs> for MovieRequest {
    fn from(args: RequestArgs) -> Self {
        MovieRequest {
            title: args.title,
            genre: args.genre,
            description: args.description,
            style: args.style,
            num_scenes: args.num_scenes,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Script, images, clips and final render in one go.
    Create(RequestArgs),
    /// Only write and segment the script.
    Script(RequestArgs),
    /// Split an existing script file into scenes.
    Segment {
        file: PathBuf,
        #[arg(long, default_value = "Action")]
        genre: String,
        #[arg(long, default_value = "Cinematic")]
        style: String,
    },
    /// Assemble existing clips into a movie.
    Compose {
        #[command(flatten)]
        request: RequestArgs,
        #[arg(required = true)]
        clips: Vec<PathBuf>,
    },
    /// Render a placeholder poster image.
    Poster,
    #[command(subcommand)]
    History(HistoryCommand),
}

#[derive(Subcommand)]
enum HistoryCommand {
    List,
    Show { id: String },
    Delete { id: String },
}

fn print_outcome(outcome: &MovieOutcome) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&outcome.record)?);
    for failure in &outcome.skipped {
        eprintln!(
            "[WARNING] scene {} skipped: {}",
            failure.scene_id, failure.reason
        );
    }
    if !outcome.persisted {
        eprintln!("[WARNING] video rendered but not saved to history");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let cfg = Config::load_or_default(&cli.config).await?;
    init::ensure_directories(&cfg).await?;

    if !init::check_ffmpeg().await {
        eprintln!("[WARNING] FFmpeg not found in PATH. Please install FFmpeg.");
    }

    if let Command::Segment { file, genre, style } = &cli.command {
        let raw = tokio::fs::read_to_string(file)
            .await
            .with_context(|| format!("Failed to read script: {}", file.display()))?;
        let scenes = script::segment(&raw, genre, style);
        println!("{}", serde_json::to_string_pretty(&scenes)?);
        return Ok(());
    }

    let studio = Studio::from_config(cfg)?;

    match cli.command {
        Command::Create(args) => {
            let outcome = studio.run_generation(&args.into()).await?;
            print_outcome(&outcome)?;
        }
        Command::Script(args) => {
            let draft = studio.generate_script(&args.into()).await?;
            println!("{}", serde_json::to_string_pretty(&draft)?);
        }
        Command::Compose { request, clips } => {
            let outcome = studio.assemble(&request.into(), &clips).await?;
            print_outcome(&outcome)?;
        }
        Command::Poster => {
            let path = studio.generate_poster().await?;
            println!("{}", path.display());
        }
        Command::History(HistoryCommand::List) => {
            let movies = studio.history().list().await?;
            if movies.is_empty() {
                println!("No movies in {}", studio.history().path().display());
            }
            for movie in movies {
                println!(
                    "{}  {}  [{} / {}]  {:.1}s  {}",
                    movie.id,
                    movie.title,
                    movie.genre,
                    movie.style,
                    movie.video_info.duration_seconds,
                    movie.video_url
                );
            }
        }
        Command::History(HistoryCommand::Show { id }) => match studio.history().get(&id).await? {
            Some(movie) => println!("{}", serde_json::to_string_pretty(&movie)?),
            None => anyhow::bail!("Movie not found: {}", id),
        },
        Command::History(HistoryCommand::Delete { id }) => match studio.delete_movie(&id).await? {
            Some(movie) => println!("Deleted {} ({})", movie.id, movie.title),
            None => anyhow::bail!("Movie not found: {}", id),
        },
        Command::Segment { .. } => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn create_args_become_request() {
        let cli = Cli::try_parse_from([
            "movie-studio",
            "create",
            "--title",
            "Glass Harbor",
            "--genre",
            "Thriller",
            "--num-scenes",
            "3",
        ])
        .unwrap();
        let Command::Create(args) = cli.command else {
            panic!("expected create");
        };
        let request: MovieRequest = args.into();
        assert_eq!(request.title, "Glass Harbor");
        assert_eq!(request.genre, "Thriller");
        assert_eq!(request.style, "Cinematic");
        assert_eq!(request.num_scenes, 3);
    }

    #[test]
    fn compose_requires_clips() {
        assert!(Cli::try_parse_from(["movie-studio", "compose"]).is_err());
        let cli = Cli::try_parse_from(["movie-studio", "compose", "a.mp4", "b.mp4"]).unwrap();
        let Command::Compose { request, clips } = cli.command else {
            panic!("expected compose");
        };
        assert_eq!(clips.len(), 2);
        assert_eq!(request.num_scenes, 5);
    }
}
