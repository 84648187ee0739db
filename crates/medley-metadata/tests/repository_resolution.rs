use std::fs;

use anyhow::Result;
use medley_metadata::{MetadataError, MetadataRepository, MovieInfo};
use medley_test_support::StaticCatalog;
use serde_json::json;
use tempfile::TempDir;

fn movie_catalog() -> StaticCatalog {
    StaticCatalog::new()
        .with_movie(
            "tt1",
            json!({"id": "tt1", "title": "X", "year": 2020, "poster": "p.jpg"}),
        )
        .with_image("p.jpg", vec![1, 2, 3, 4])
}

#[test]
fn eager_resolution_populates_an_empty_repository() -> Result<()> {
    let temp = TempDir::new()?;
    let repo = MetadataRepository::new(temp.path(), false)?;
    let catalog = movie_catalog();

    let movie = repo.resolve_movie("tt1", &catalog)?;
    let poster = repo.resolve_poster("tt1", &movie.poster, &catalog)?;

    let stored: MovieInfo = serde_json::from_slice(&fs::read(temp.path().join("movies/tt1.json"))?)?;
    assert_eq!(stored, movie);
    assert_eq!(stored.title, "X");
    assert_eq!(stored.year, "2020");
    assert_eq!(poster, temp.path().join("imgs/tt1.jpg"));
    assert_eq!(fs::read(&poster)?, vec![1, 2, 3, 4]);
    Ok(())
}

#[test]
fn lazy_resolution_prefers_the_existing_entry() -> Result<()> {
    let temp = TempDir::new()?;
    let seeded = MovieInfo {
        id: "tt1".to_string(),
        title: "Seeded".to_string(),
        year: "1999".to_string(),
        poster: "old.jpg".to_string(),
    };
    fs::create_dir_all(temp.path().join("movies"))?;
    fs::write(
        temp.path().join("movies/tt1.json"),
        serde_json::to_vec(&seeded)?,
    )?;

    let repo = MetadataRepository::new(temp.path(), true)?;
    let catalog = movie_catalog();
    let movie = repo.resolve_movie("tt1", &catalog)?;

    assert_eq!(movie.title, "Seeded");
    assert_eq!(catalog.fetches(), 0);
    Ok(())
}

#[test]
fn repeated_lazy_resolution_fetches_once() -> Result<()> {
    let temp = TempDir::new()?;
    let repo = MetadataRepository::new(temp.path(), true)?;
    let catalog = movie_catalog();

    let first = repo.resolve_movie("tt1", &catalog)?;
    let bytes = fs::read(temp.path().join("movies/tt1.json"))?;
    let second = repo.resolve_movie("tt1", &catalog)?;

    assert_eq!(first, second);
    assert_eq!(fs::read(temp.path().join("movies/tt1.json"))?, bytes);
    assert_eq!(catalog.fetches(), 1);
    Ok(())
}

#[test]
fn catalog_misses_surface_unchanged_and_write_nothing() -> Result<()> {
    let temp = TempDir::new()?;
    let repo = MetadataRepository::new(temp.path(), true)?;
    let catalog = StaticCatalog::new();

    let err = repo.resolve_series("tt9", &catalog).unwrap_err();
    match err {
        MetadataError::Fetch { kind, key, source } => {
            assert_eq!(kind, "series");
            assert_eq!(key, "tt9");
            assert!(source.to_string().contains("not in catalog"));
        }
        other => anyhow::bail!("unexpected error: {other:?}"),
    }
    assert!(!temp.path().join("series").exists());
    Ok(())
}

#[test]
fn episodes_share_the_series_directory() -> Result<()> {
    let temp = TempDir::new()?;
    let repo = MetadataRepository::new(temp.path(), true)?;
    let catalog = StaticCatalog::new().with_episode(
        "tt5",
        2,
        7,
        json!({"title": "Seven", "season": 2, "episode": 7, "year": 2004}),
    );

    let episode = repo.resolve_episode("tt5", 2, 7, &catalog)?;
    assert_eq!(episode.year.as_deref(), Some("2004"));
    assert!(temp.path().join("series/tt5.2.7.json").is_file());
    Ok(())
}
