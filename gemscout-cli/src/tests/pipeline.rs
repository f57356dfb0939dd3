//! End-to-end runs of `score` and `rescore` against files on disk.

use super::helpers::{STANDOUT, Workspace, ZONE_NAME, standout_listings, write_utf8};
use super::*;
use crate::rescore::execute_rescore;
use crate::score::execute_score;
use gemscout_core::ValueTier;
use gemscout_data::read_scored;
use gemscout_model::{ModelError, load_model};
use rstest::{fixture, rstest};
use std::fs;

#[fixture]
fn workspace() -> Workspace {
    let workspace = Workspace::new();
    workspace.write_zones();
    workspace.write_facilities();
    workspace
}

#[rstest]
fn score_writes_ranked_dataset_and_model(workspace: Workspace) {
    let listings = workspace.write_listings("listings.json", &standout_listings(4.9));
    let config = workspace.score_config(listings);

    let summary = execute_score(&config).expect("score should succeed");
    assert_eq!(summary.listings_read, 102);
    assert_eq!(summary.listings_dropped, 1);
    assert_eq!(summary.duplicates_collapsed, 1);
    assert_eq!(summary.restaurants_scored, 100);
    assert_eq!(summary.count(ValueTier::Gem), 1);
    assert_eq!(summary.count(ValueTier::FairBelow), 99);
    assert_eq!(summary.top_categories, vec!["Hawker".to_owned()]);
    let training = summary.training.as_ref().expect("training summary");
    assert_eq!(training.rows, 100);
    assert!(training.cv.is_some());

    let records = read_scored(&config.output).expect("scored dataset");
    let top = records.first().expect("at least one record");
    assert_eq!(top.name, STANDOUT);
    assert_eq!(top.value_tier, ValueTier::Gem);
    assert_eq!(top.planning_area, ZONE_NAME);
    assert!(top.is_facility_adjacent);
    assert_eq!(top.model_version, summary.model.version);

    let model = load_model(&config.model).expect("saved model");
    assert_eq!(*model.info(), summary.model);
    assert_eq!(model.schema().top_categories, vec!["Hawker".to_owned()]);
}

#[rstest]
fn failed_fit_leaves_previous_outputs(workspace: Workspace) {
    let previous = b"[]\n";
    let output = workspace.path("scored.json");
    write_utf8(&output, previous);
    let listings = workspace.write_listings("listings.json", &[]);
    let config = workspace.score_config(listings);

    let err = execute_score(&config).expect_err("empty corpus cannot be fitted");
    match err {
        CliError::ModelFit(ModelError::EmptyTrainingSet) => {}
        other => panic!("expected ModelFit, found {other:?}"),
    }
    assert_eq!(fs::read(output.as_std_path()).expect("read output"), previous);
    assert!(!config.model.exists());
}

#[rstest]
fn unwritable_model_keeps_previous_dataset(workspace: Workspace) {
    let previous = b"[]\n";
    let output = workspace.path("scored.json");
    write_utf8(&output, previous);
    write_utf8(&workspace.path("blocker"), b"not a directory");
    let listings = workspace.write_listings("listings.json", &standout_listings(4.9));
    let mut config = workspace.score_config(listings);
    config.model = workspace.path("blocker/model.bin");

    let err = execute_score(&config).expect_err("model path cannot be created");
    assert!(matches!(err, CliError::ModelArtefact(_)), "{err:?}");
    assert_eq!(fs::read(output.as_std_path()).expect("read output"), previous);
    let leftovers: Vec<_> = fs::read_dir(workspace.path("").as_std_path())
        .expect("list workspace")
        .filter_map(Result::ok)
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty(), "staged dataset left behind");
}

#[rstest]
fn missing_reference_layers_degrade(workspace: Workspace) {
    let listings = workspace.write_listings("listings.json", &standout_listings(4.9));
    let mut config = workspace.score_config(listings);
    config.sources.zones = Some(workspace.path("absent-zones.geojson"));
    config.sources.facilities = None;

    let summary = execute_score(&config).expect("score should succeed");
    assert_eq!(summary.count(ValueTier::Gem), 1);
    let records = read_scored(&config.output).expect("scored dataset");
    assert!(records.iter().all(|r| !r.is_facility_adjacent));
    assert!(records.iter().all(|r| r.planning_area != ZONE_NAME));
}

#[rstest]
fn rescore_reuses_saved_model(workspace: Workspace) {
    let training = workspace.write_listings("listings.json", &standout_listings(4.9));
    let trained = execute_score(&workspace.score_config(training)).expect("score");

    let fresh = workspace.write_listings("fresh.json", &standout_listings(3.0));
    let config = workspace.rescore_config(fresh);
    let summary = execute_rescore(&config).expect("rescore should succeed");

    assert!(summary.training.is_none());
    assert_eq!(summary.model, trained.model);
    assert_eq!(summary.count(ValueTier::Gem), 0);
    assert_eq!(summary.count(ValueTier::Overvalued), 1);
    let records = read_scored(&config.output).expect("rescored dataset");
    let last = records.last().expect("at least one record");
    assert_eq!(last.name, STANDOUT);
    assert_eq!(last.model_fitted_at, trained.model.fitted_at_unix);
}

#[rstest]
fn rescore_without_restaurants_keeps_previous_dataset(workspace: Workspace) {
    let training = workspace.write_listings("listings.json", &standout_listings(4.9));
    execute_score(&workspace.score_config(training)).expect("score");
    let fresh = workspace.write_listings("fresh.json", &standout_listings(3.0));
    execute_rescore(&workspace.rescore_config(fresh)).expect("first rescore");
    let config = workspace.rescore_config(workspace.write_listings("empty.json", &[]));
    let previous = fs::read(config.output.as_std_path()).expect("read rescored dataset");

    let err = execute_rescore(&config).expect_err("nothing to score");
    match err {
        CliError::EmptyCorpus { path } => assert_eq!(path, config.sources.listings),
        other => panic!("expected EmptyCorpus, found {other:?}"),
    }
    assert_eq!(
        fs::read(config.output.as_std_path()).expect("read rescored dataset"),
        previous
    );
}

#[rstest]
fn rescore_reports_the_artefact_categories(workspace: Workspace) {
    let training = workspace.write_listings("listings.json", &standout_listings(4.9));
    execute_score(&workspace.score_config(training)).expect("score");
    let japanese: Vec<_> = standout_listings(4.0)
        .into_iter()
        .map(|mut listing| {
            listing.category = Some("Japanese".to_owned());
            listing
        })
        .collect();
    let config = workspace.rescore_config(workspace.write_listings("fresh.json", &japanese));

    let summary = execute_rescore(&config).expect("rescore should succeed");
    assert_eq!(summary.top_categories, vec!["Hawker".to_owned()]);
    let records = read_scored(&config.output).expect("rescored dataset");
    assert!(records.iter().all(|r| r.category_encoded == "Other"));
}

#[rstest]
fn rescore_requires_model_artefact(workspace: Workspace) {
    let listings = workspace.write_listings("listings.json", &standout_listings(4.9));
    let config = workspace.rescore_config(listings);

    let err = execute_rescore(&config).expect_err("model artefact is missing");
    match err {
        CliError::MissingSourceFile { field, path } => {
            assert_eq!(field, ARG_MODEL);
            assert_eq!(path, config.model);
        }
        other => panic!("expected MissingSourceFile, found {other:?}"),
    }
}

#[rstest]
fn rescore_rejects_foreign_artefact(workspace: Workspace) {
    let listings = workspace.write_listings("listings.json", &standout_listings(4.9));
    let config = workspace.rescore_config(listings);
    write_utf8(&config.model, b"not a model");

    let err = execute_rescore(&config).expect_err("foreign artefact");
    assert!(matches!(err, CliError::ModelArtefact(_)), "{err:?}");
    assert!(!config.output.exists());
}
