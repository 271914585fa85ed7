use ahash::AHashMap;
use anyhow::{bail, Context};
use clap::{Args as CommandArgs, Parser, Subcommand};
use playsift::config::{playlist_label, DataConfig, EmbeddingSource};
use playsift::stats::{Count, Summary};
use playsift::{
    filter, finalize_to, nearest_neighbors, rank, Field, InstrumentalOrVoice, KeyProfile,
    Neighbor, Predicate, RankedTrack, RankingSpec, Scale,
};
use playsift::PostProcessor;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Build playlists from music feature and embedding tables
#[derive(Parser, Debug)]
#[command(name = "playsift")]
#[command(about = "Filter, rank and find similar tracks in an analysed music collection", long_about = None)]
struct Args {
    /// Feature table (header-less CSV)
    #[arg(long, global = true)]
    features: Option<PathBuf>,

    /// Style classifier metadata with the `classes` list
    #[arg(long, global = true)]
    vocabulary: Option<PathBuf>,

    /// Embedding table as NAME=PATH (repeatable; defaults to discogs and musicnn)
    #[arg(long = "embeddings", global = true)]
    embeddings: Vec<EmbeddingSource>,

    /// Directory for generated playlists
    #[arg(long, global = true)]
    playlist_dir: Option<PathBuf>,

    /// Log level
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Select tracks by features, rank them and write a playlist
    Filter(FilterArgs),
    /// Write playlists of the tracks closest to a query track
    Similar(SimilarArgs),
    /// Summarise the collection
    Stats(StatsArgs),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Bounds {
    lo: f64,
    hi: f64,
}

fn parse_bounds(s: &str) -> Result<Bounds, String> {
    let (lo, hi) = s
        .split_once("..")
        .ok_or_else(|| format!("expected LO..HI, got '{}'", s))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .map_err(|_| format!("'{}' is not a number", v))
    };
    Ok(Bounds {
        lo: parse(lo)?,
        hi: parse(hi)?,
    })
}

#[derive(CommandArgs, Debug)]
struct FilterArgs {
    /// Tempo range in BPM, e.g. 120..130
    #[arg(long, value_parser = parse_bounds)]
    tempo: Option<Bounds>,

    /// Loudness range, e.g. -20..-5
    #[arg(long, value_parser = parse_bounds, allow_hyphen_values = true)]
    loudness: Option<Bounds>,

    /// Danceability range, e.g. 0.5..1.0
    #[arg(long, value_parser = parse_bounds)]
    danceability: Option<Bounds>,

    /// Arousal range
    #[arg(long, value_parser = parse_bounds)]
    arousal: Option<Bounds>,

    /// Valence range
    #[arg(long, value_parser = parse_bounds)]
    valence: Option<Bounds>,

    /// Keep tracks whose activation of this style is within --style-range (repeatable)
    #[arg(long = "style")]
    styles: Vec<String>,

    /// Activation range applied to every --style
    #[arg(long, value_parser = parse_bounds, default_value = "0.5..1.0")]
    style_range: Bounds,

    /// Instrumental or Voice
    #[arg(long)]
    voice: Option<InstrumentalOrVoice>,

    /// Pitch class of the key, e.g. C, F#, Eb
    #[arg(long, requires = "scale")]
    key: Option<String>,

    /// major or minor
    #[arg(long, requires = "key")]
    scale: Option<Scale>,

    /// Key profile used with --key/--scale
    #[arg(long, default_value = "temperley")]
    profile: KeyProfile,

    /// Rank by a field, e.g. tempo:desc or style:Electronic---House:asc
    #[arg(long, conflicts_with = "rank_styles")]
    rank: Option<RankingSpec>,

    /// Rank by the product of these style activations, highest first (repeatable)
    #[arg(long = "rank-style")]
    rank_styles: Vec<String>,

    /// Maximum number of tracks (0 for all)
    #[arg(long, default_value_t = 0)]
    max_tracks: usize,

    /// Shuffle the (capped) playlist
    #[arg(long)]
    shuffle: bool,

    /// Seed for a reproducible shuffle
    #[arg(long)]
    seed: Option<u64>,

    /// Playlist path (defaults to <playlist-dir>/<label>_playlist.m3u8)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of tracks to print
    #[arg(long, default_value_t = 10)]
    preview: usize,
}

impl FilterArgs {
    fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = Vec::new();
        let ranges = [
            (Field::Tempo, self.tempo),
            (Field::Loudness, self.loudness),
            (Field::Danceability, self.danceability),
            (Field::Arousal, self.arousal),
            (Field::Valence, self.valence),
        ];
        for (field, bounds) in ranges {
            if let Some(b) = bounds {
                predicates.push(Predicate::range(field, b.lo, b.hi));
            }
        }
        for style in &self.styles {
            predicates.push(Predicate::range(
                Field::style(style.as_str()),
                self.style_range.lo,
                self.style_range.hi,
            ));
        }
        if let Some(voice) = self.voice {
            predicates.push(Predicate::one_of(Field::InstrumentalOrVoice, [voice.name()]));
        }
        if let (Some(key), Some(scale)) = (&self.key, self.scale) {
            predicates.push(Predicate::key_scale(self.profile, key.as_str(), scale));
        }
        predicates
    }

    fn ranking(&self) -> Option<RankingSpec> {
        if self.rank_styles.is_empty() {
            self.rank.clone()
        } else {
            Some(RankingSpec::style_product(self.rank_styles.iter().cloned()))
        }
    }

    fn post_processor(&self) -> PostProcessor {
        let processor = PostProcessor::new(self.max_tracks, self.shuffle);
        match self.seed {
            Some(seed) => processor.with_seed(seed),
            None => processor,
        }
    }
}

#[derive(CommandArgs, Debug)]
struct SimilarArgs {
    /// Query track: full key or a unique file name suffix
    #[arg(short, long)]
    track: String,

    /// Number of neighbours per space (0 for all)
    #[arg(long, default_value_t = 10)]
    limit: usize,

    /// Keep the query track in the results
    #[arg(long)]
    include_query: bool,

    /// Only query these embedding spaces (repeatable)
    #[arg(long = "space")]
    spaces: Vec<String>,
}

#[derive(CommandArgs, Debug)]
struct StatsArgs {
    /// Number of styles to list
    #[arg(long, default_value_t = 10)]
    top: usize,
}

#[derive(Serialize)]
struct FilterReport {
    playlist: String,
    matched: usize,
    tracks: Vec<RankedTrack>,
}

#[derive(Serialize)]
struct SimilarReport {
    space: String,
    query: String,
    playlist: String,
    neighbors: Vec<Neighbor>,
}

#[derive(Serialize)]
struct KeyReport {
    profile: KeyProfile,
    counts: Vec<Count>,
}

#[derive(Serialize)]
struct StatsReport {
    tracks: usize,
    fields: Vec<(String, Summary)>,
    top_styles: Vec<Count>,
    parent_genres: Vec<Count>,
    keys: Vec<KeyReport>,
    instrumental_voice: Vec<Count>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // stdout is reserved for results
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting playsift v{}", env!("CARGO_PKG_VERSION"));

    let config = DataConfig::resolve(
        args.features.clone(),
        args.vocabulary.clone(),
        args.embeddings.clone(),
        args.playlist_dir.clone(),
    )?;

    match &args.command {
        Command::Filter(cmd) => run_filter(&config, cmd, args.json),
        Command::Similar(cmd) => run_similar(&config, cmd, args.json),
        Command::Stats(cmd) => run_stats(&config, cmd, args.json),
    }
}

fn run_filter(config: &DataConfig, args: &FilterArgs, json: bool) -> anyhow::Result<()> {
    let store = config.load_feature_store()?;
    let predicates = args.predicates();
    let ranking = args.ranking();
    if let Some(spec) = &ranking {
        spec.validate(&store)?;
    }

    let results = filter(&store, &predicates)?;
    let ranked = rank(&results, &store, ranking.as_ref())?;
    info!("{} of {} tracks match", results.len(), store.len());

    let sort_keys: AHashMap<String, Option<f64>> = ranked
        .iter()
        .map(|t| (t.key.clone(), t.sort_key))
        .collect();
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| config.feature_playlist_path(&playlist_label(&predicates)));

    let keys = ranked.into_iter().map(|t| t.key).collect();
    let playlist = finalize_to(&args.post_processor(), keys, &output)?;

    let tracks: Vec<RankedTrack> = playlist
        .tracks()
        .iter()
        .map(|key| RankedTrack {
            key: key.clone(),
            sort_key: sort_keys.get(key).copied().flatten(),
        })
        .collect();

    if json {
        let report = FilterReport {
            playlist: output.display().to_string(),
            matched: results.len(),
            tracks,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{} tracks matched, {} written to {}",
        results.len(),
        playlist.len(),
        output.display()
    );
    let shown = args.preview.min(tracks.len());
    if shown > 0 {
        println!("{:>5}  {:>12}  TRACK", "#", "RANK");
        for (i, track) in tracks[..shown].iter().enumerate() {
            let sort_key = track
                .sort_key
                .map(|v| format!("{:.4}", v))
                .unwrap_or_else(|| "-".to_string());
            println!("{:>5}  {:>12}  {}", i + 1, sort_key, track.key);
        }
        if tracks.len() > shown {
            println!("  ... {} more", tracks.len() - shown);
        }
    }
    Ok(())
}

fn run_similar(config: &DataConfig, args: &SimilarArgs, json: bool) -> anyhow::Result<()> {
    let store = config.load_embedding_store()?;
    for name in &args.spaces {
        if store.space(name).is_none() {
            bail!(
                "Unknown embedding space '{}' (loaded: {})",
                name,
                store.names().collect::<Vec<_>>().join(", ")
            );
        }
    }

    let mut reports = Vec::new();
    for space in store.spaces() {
        if !args.spaces.is_empty() && !args.spaces.iter().any(|s| s == space.name()) {
            continue;
        }

        let query = space.key(space.resolve(&args.track)?).to_string();
        let neighbors = nearest_neighbors(&query, space, !args.include_query, args.limit)
            .with_context(|| format!("Similarity search in '{}' failed", space.name()))?;

        let output = config.similarity_playlist_path(space.name());
        let keys = neighbors.iter().map(|n| n.key.clone()).collect();
        finalize_to(&PostProcessor::default(), keys, &output)?;

        reports.push(SimilarReport {
            space: space.name().to_string(),
            query,
            playlist: output.display().to_string(),
            neighbors,
        });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    for report in &reports {
        println!(
            "[{}] nearest to {} -> {}",
            report.space, report.query, report.playlist
        );
        for (i, n) in report.neighbors.iter().enumerate() {
            println!("{:>5}  {:>8.4}  {}", i + 1, n.similarity, n.key);
        }
    }
    Ok(())
}

fn run_stats(config: &DataConfig, args: &StatsArgs, json: bool) -> anyhow::Result<()> {
    let store = config.load_feature_store()?;

    let report = StatsReport {
        tracks: store.len(),
        fields: store
            .describe_all()?
            .into_iter()
            .map(|(field, summary)| (field.to_string(), summary))
            .collect(),
        top_styles: store.top_style_counts().into_iter().take(args.top).collect(),
        parent_genres: store.parent_genre_counts(),
        keys: KeyProfile::ALL
            .iter()
            .map(|&profile| KeyReport {
                profile,
                counts: store.key_scale_counts(profile),
            })
            .collect(),
        instrumental_voice: store.instrumental_voice_counts(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{} tracks\n", report.tracks);
    println!(
        "{:<14} {:>6} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "FIELD", "COUNT", "MEAN", "STD", "MIN", "25%", "50%", "75%", "MAX"
    );
    for (field, s) in &report.fields {
        println!(
            "{:<14} {:>6} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
            field,
            s.count,
            cell(s.mean),
            cell(s.std),
            cell(s.min),
            cell(s.p25),
            cell(s.p50),
            cell(s.p75),
            cell(s.max)
        );
    }

    print_counts("Top styles", &report.top_styles);
    print_counts("Parent genres", &report.parent_genres);
    for key in &report.keys {
        print_counts(&format!("Keys ({})", key.profile), &key.counts);
    }
    print_counts("Instrumental / voice", &report.instrumental_voice);
    Ok(())
}

fn cell(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.3}", v))
        .unwrap_or_else(|| "-".to_string())
}

fn print_counts(title: &str, counts: &[Count]) {
    println!("\n{}", title);
    for c in counts {
        println!("  {:>6}  {}", c.count, c.label);
    }
}
