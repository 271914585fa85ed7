// Integration tests for playsift
use playsift::config::{playlist_label, DataConfig, EmbeddingSource};
use playsift::prelude::*;
use std::path::Path;
use std::process::Command;

const VOCABULARY: &str = r#"{
    "name": "Discogs-Effnet",
    "classes": ["Rock---Punk", "Electronic---House", "Electronic---Techno"]
}"#;

// key, tempo, 3x (key, scale), loudness, label, danceability, arousal, valence, 3 activations
const FEATURES: &str = "\
audio/a.mp3,120,C,major,C,major,C,minor,-8,Voice,0.7,5.0,6.0,0.8,0.2,0.1
audio/b.mp3,90,D,minor,D,minor,D,minor,-10,Instrumental,0.3,2.0,7.5,0.3,0.9,0.2
audio/c.mp3,150,C,major,G,major,C,major,-6,Voice,0.95,8.0,3.0,0.5,0.5,0.9
audio/d.mp3,128,A,minor,A,minor,A,minor,-5,Instrumental,0.9,7.0,6.5,0.1,0.7,0.8
";

const DISCOGS: &str = "\
audio/a.mp3,1.0,0.0,0.0
audio/b.mp3,1.0,0.0,0.0
audio/c.mp3,0.0,1.0,0.0
audio/d.mp3,0.6,0.8,0.0
";

const MUSICNN: &str = "\
audio/a.mp3,0.0,1.0
audio/b.mp3,1.0,0.0
audio/c.mp3,0.0,2.0
audio/d.mp3,1.0,1.0
";

fn write(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn setup(dir: &Path) -> DataConfig {
    let features = write(dir, "features.csv", FEATURES);
    let vocabulary = write(dir, "classes.json", VOCABULARY);
    let discogs = write(dir, "discogs.csv", DISCOGS);
    let musicnn = write(dir, "musicnn.csv", MUSICNN);
    DataConfig::resolve(
        Some(features),
        Some(vocabulary),
        // custom names: the toy tables do not have the real dimensions
        vec![
            EmbeddingSource::new("toy_discogs", discogs),
            EmbeddingSource::new("toy_musicnn", musicnn),
        ],
        Some(dir.join("playlists")),
    )
    .unwrap()
}

fn keys(ranked: &[RankedTrack]) -> Vec<&str> {
    ranked.iter().map(|t| t.key.as_str()).collect()
}

#[test]
fn test_filter_rank_write_playlist() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path());
    let store = config.load_feature_store().unwrap();
    assert_eq!(store.len(), 4);

    let predicates = [Predicate::range(Field::Tempo, 100.0, 150.0)];
    let hits = filter(&store, &predicates).unwrap();
    let ranked = rank(
        &hits,
        &store,
        Some(&RankingSpec::by_field(Field::Tempo, SortOrder::Descending)),
    )
    .unwrap();
    assert_eq!(keys(&ranked), vec!["audio/c.mp3", "audio/d.mp3", "audio/a.mp3"]);

    let output = config.feature_playlist_path(&playlist_label(&predicates));
    assert!(output.ends_with("playlists/tempo_playlist.m3u8"));

    let track_keys = ranked.into_iter().map(|t| t.key).collect();
    let playlist = finalize_to(&PostProcessor::new(2, false), track_keys, &output).unwrap();
    assert_eq!(playlist.len(), 2);
    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        "../audio/c.mp3\n../audio/d.mp3"
    );
}

#[test]
fn test_genre_filter_and_style_product() {
    let dir = tempfile::tempdir().unwrap();
    let store = setup(dir.path()).load_feature_store().unwrap();

    let hits = filter(
        &store,
        &[Predicate::range(Field::style("Electronic---House"), 0.5, 1.0)],
    )
    .unwrap();
    assert_eq!(hits.keys(), &["audio/b.mp3", "audio/c.mp3", "audio/d.mp3"]);

    // b: 0.9 * 0.2 = 0.18, c: 0.5 * 0.9 = 0.45, d: 0.7 * 0.8 = 0.56
    let ranked = rank(
        &hits,
        &store,
        Some(&RankingSpec::style_product([
            "Electronic---House",
            "Electronic---Techno",
        ])),
    )
    .unwrap();
    assert_eq!(keys(&ranked), vec!["audio/d.mp3", "audio/c.mp3", "audio/b.mp3"]);
}

#[test]
fn test_refining_matches_single_conjunction() {
    let dir = tempfile::tempdir().unwrap();
    let store = setup(dir.path()).load_feature_store().unwrap();

    let p1 = Predicate::range(Field::Danceability, 0.5, 1.0);
    let p2 = Predicate::one_of(Field::InstrumentalOrVoice, ["Instrumental"]);

    let both = filter(&store, &[p1.clone(), p2.clone()]).unwrap();
    let stepwise = refine(&store, &filter(&store, &[p1]).unwrap(), &[p2]).unwrap();
    assert_eq!(both, stepwise);
    assert_eq!(both.keys(), &["audio/d.mp3"]);
}

#[test]
fn test_invalid_queries_fail_before_reading_rows() {
    let dir = tempfile::tempdir().unwrap();
    let store = setup(dir.path()).load_feature_store().unwrap();

    assert!(matches!(
        filter(&store, &[Predicate::range(Field::Tempo, 150.0, 100.0)]),
        Err(Error::InvalidRange { .. })
    ));
    assert!(matches!(
        filter(&store, &[Predicate::range(Field::style("Jazz---Bebop"), 0.5, 1.0)]),
        Err(Error::Schema(_))
    ));
}

#[test]
fn test_similarity_per_space() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path());
    let embeddings = config.load_embedding_store().unwrap();
    assert_eq!(
        embeddings.names().collect::<Vec<_>>(),
        vec!["toy_discogs", "toy_musicnn"]
    );

    let discogs = embeddings.space("toy_discogs").unwrap();
    let query = discogs.key(discogs.resolve("a.mp3").unwrap()).to_string();
    let neighbors = nearest_neighbors(&query, discogs, true, 0).unwrap();
    let names: Vec<&str> = neighbors.iter().map(|n| n.key.as_str()).collect();
    assert_eq!(names, vec!["audio/b.mp3", "audio/d.mp3", "audio/c.mp3"]);
    assert!((neighbors[0].similarity - 1.0).abs() < 1e-6);
    assert!((neighbors[1].similarity - 0.6).abs() < 1e-6);

    let musicnn = embeddings.space("toy_musicnn").unwrap();
    let top = nearest_neighbors("audio/a.mp3", musicnn, true, 1).unwrap();
    assert_eq!(top[0].key, "audio/c.mp3");

    let output = config.similarity_playlist_path("toy_discogs");
    let playlist = finalize_to(
        &PostProcessor::default(),
        neighbors.into_iter().map(|n| n.key).collect(),
        &output,
    )
    .unwrap();
    assert_eq!(playlist.len(), 3);
    assert!(output.ends_with("playlists/toy_discogs_playlist.m3u"));
}

#[test]
fn test_known_space_dimension_checked_at_load() {
    let dir = tempfile::tempdir().unwrap();
    let discogs = write(dir.path(), "discogs.csv", DISCOGS);
    let config = DataConfig::resolve(
        None,
        None,
        vec![EmbeddingSource::new("discogs", discogs)],
        None,
    )
    .unwrap();
    let err = config.load_embedding_store().unwrap_err();
    assert!(format!("{:#}", err).contains("1280"));
}

#[test]
fn test_shuffled_playlist_keeps_top_tracks() {
    let dir = tempfile::tempdir().unwrap();
    let store = setup(dir.path()).load_feature_store().unwrap();
    let all = filter(&store, &[]).unwrap();
    let ranked = rank(
        &all,
        &store,
        Some(&RankingSpec::by_field(Field::Danceability, SortOrder::Descending)),
    )
    .unwrap();
    let track_keys: Vec<TrackKey> = ranked.into_iter().map(|t| t.key).collect();

    let playlist = PostProcessor::new(2, true).with_seed(3).finalize(track_keys);
    let mut got = playlist.tracks().to_vec();
    got.sort();
    assert_eq!(got, vec!["audio/c.mp3", "audio/d.mp3"]);
}

#[test]
fn test_collection_statistics() {
    let dir = tempfile::tempdir().unwrap();
    let store = setup(dir.path()).load_feature_store().unwrap();

    let tempo = store.describe_field(&Field::Tempo).unwrap();
    assert_eq!(tempo.count, 4);
    assert_eq!(tempo.min, Some(90.0));
    assert_eq!(tempo.max, Some(150.0));

    let parents = store.parent_genre_counts();
    assert_eq!(parents[0].label, "Electronic");
    assert_eq!(parents[0].count, 3);
}

#[test]
fn test_cli_filter_writes_playlist() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path());
    let output = dir.path().join("out.m3u8");

    let status = Command::new(env!("CARGO_BIN_EXE_playsift"))
        .arg("--features")
        .arg(&config.features)
        .arg("--vocabulary")
        .arg(&config.vocabulary)
        .args(["filter", "--voice", "Voice", "--rank", "tempo:asc", "--output"])
        .arg(&output)
        .output()
        .unwrap();
    assert!(status.status.success(), "{}", String::from_utf8_lossy(&status.stderr));
    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        "../audio/a.mp3\n../audio/c.mp3"
    );
}

#[test]
fn test_cli_reports_unknown_style() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path());

    let out = Command::new(env!("CARGO_BIN_EXE_playsift"))
        .arg("--features")
        .arg(&config.features)
        .arg("--vocabulary")
        .arg(&config.vocabulary)
        .arg("--playlist-dir")
        .arg(&config.playlist_dir)
        .args(["filter", "--style", "Jazz---Bebop"])
        .output()
        .unwrap();
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("Jazz---Bebop"));
    assert!(!config.playlist_dir.exists());
}

#[test]
fn test_cli_rejects_unknown_rank_style_before_filtering() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path());

    let out = Command::new(env!("CARGO_BIN_EXE_playsift"))
        .arg("--features")
        .arg(&config.features)
        .arg("--vocabulary")
        .arg(&config.vocabulary)
        .arg("--playlist-dir")
        .arg(&config.playlist_dir)
        .args(["filter", "--tempo", "100..150", "--rank-style", "Jazz---Bebop"])
        .output()
        .unwrap();
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Jazz---Bebop"), "{}", stderr);
    assert!(!stderr.contains("tracks match"));
    assert!(!config.playlist_dir.exists());
}
