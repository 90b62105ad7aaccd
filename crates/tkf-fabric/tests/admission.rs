//! Admission engine behavior against a deterministic semantic judge

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tkf_core::{KnowledgeUpdate, Metadata};
use tkf_fabric::{
    AdmissionMode, AdmissionOutcome, FabricConfig, InMemoryKnowledgeStore, KnowledgeStore,
};
use tkf_test_utils::{judged_generator, names, SemanticJudge};

#[test]
fn judge_speaks_the_checker_protocol() {
    assert_eq!(names::DUPLICATE_CHECKER, tkf_fabric::DUPLICATE_CHECKER);
    assert_eq!(names::CONFLICT_CHECKER, tkf_fabric::CONFLICT_CHECKER);
    assert_eq!(names::FORMATTER, tkf_fabric::FORMATTER);
    assert_eq!(names::EXISTING_SECTION, tkf_fabric::sections::EXISTING);
    assert_eq!(names::CANDIDATE_SECTION, tkf_fabric::sections::CANDIDATE);
}

fn forms_judge() -> SemanticJudge {
    SemanticJudge::new().contradicting("prefer short forms", "prefer long forms")
}

fn store(mode: AdmissionMode, judge: SemanticJudge) -> InMemoryKnowledgeStore {
    InMemoryKnowledgeStore::new(
        FabricConfig::new().with_admission_mode(mode),
        Arc::new(judged_generator(judge)),
    )
}

#[tokio::test]
async fn scenario_append_duplicate_conflict_replace() {
    let store = store(AdmissionMode::Concurrent, forms_judge());
    store.seed("").await.unwrap();

    let outcome = store
        .add_update(KnowledgeUpdate::append("Users prefer short forms", "seen in runs"))
        .await
        .unwrap();
    assert_eq!(outcome, AdmissionOutcome::Appended);
    assert_eq!(store.full_content().await, "Users prefer short forms");

    let outcome = store
        .add_update(KnowledgeUpdate::append("Users prefer short forms", "seen again"))
        .await
        .unwrap();
    assert_eq!(outcome, AdmissionOutcome::RejectedDuplicate);
    assert_eq!(store.full_content().await, "Users prefer short forms");

    let outcome = store
        .add_update(KnowledgeUpdate::append("Users prefer long forms", "one run"))
        .await
        .unwrap();
    assert_eq!(outcome, AdmissionOutcome::RejectedConflict);
    assert_eq!(store.full_content().await, "Users prefer short forms");

    let outcome = store
        .add_update(KnowledgeUpdate::replace(
            "Users prefer short forms",
            "Users strongly prefer short forms",
            "stronger evidence",
        ))
        .await
        .unwrap();
    assert_eq!(outcome, AdmissionOutcome::Replaced);
    assert_eq!(store.full_content().await, "Users strongly prefer short forms");

    let history = store.updates(0, 10).await;
    assert_eq!(history.total, 4);
    assert_eq!(history.items[2].new_text, "Users prefer long forms");
}

#[tokio::test]
async fn independent_facts_accumulate_as_paragraphs() {
    let store = store(AdmissionMode::Concurrent, forms_judge());
    store.seed("Users skim onboarding text.").await.unwrap();

    for text in ["Users prefer short forms", "Users like progress indicators"] {
        let outcome = store.add_update(KnowledgeUpdate::append(text, "r")).await.unwrap();
        assert_eq!(outcome, AdmissionOutcome::Appended);
    }

    assert_eq!(
        store.full_content().await,
        "Users skim onboarding text.\n\nUsers prefer short forms\n\nUsers like progress indicators"
    );
}

#[tokio::test]
async fn replace_ignores_semantics() {
    let store = store(AdmissionMode::Concurrent, forms_judge());
    store.seed("Users prefer short forms").await.unwrap();

    // Would be a conflict on the append path.
    let outcome = store
        .add_update(KnowledgeUpdate::replace(
            "Users prefer short forms",
            "Users prefer long forms",
            "correction",
        ))
        .await
        .unwrap();

    assert_eq!(outcome, AdmissionOutcome::Replaced);
    assert_eq!(store.full_content().await, "Users prefer long forms");
}

async fn race(mode: AdmissionMode) -> (AdmissionOutcome, AdmissionOutcome, String) {
    let generator = judged_generator(forms_judge()).with_latency(Duration::from_millis(50));
    let store = InMemoryKnowledgeStore::new(
        FabricConfig::new().with_admission_mode(mode),
        Arc::new(generator),
    );
    store.seed("Base fact").await.unwrap();

    let (a, b) = tokio::join!(
        store.add_update(KnowledgeUpdate::append("Users prefer short forms", "run 1")),
        store.add_update(KnowledgeUpdate::append("Users prefer long forms", "run 2")),
    );
    (a.unwrap(), b.unwrap(), store.full_content().await)
}

#[tokio::test]
async fn concurrent_mode_admits_both_sides_of_a_conflict() {
    let (a, b, content) = race(AdmissionMode::Concurrent).await;

    assert_eq!(a, AdmissionOutcome::Appended);
    assert_eq!(b, AdmissionOutcome::Appended);
    assert!(content.contains("Users prefer short forms"));
    assert!(content.contains("Users prefer long forms"));
}

#[tokio::test]
async fn serializable_mode_checks_against_decided_admissions() {
    let (a, b, content) = race(AdmissionMode::Serializable).await;

    assert_eq!(a, AdmissionOutcome::Appended);
    assert_eq!(b, AdmissionOutcome::RejectedConflict);
    assert_eq!(content, "Base fact\n\nUsers prefer short forms");
}

#[tokio::test]
async fn serializable_seed_waits_for_admission_in_flight() {
    let generator = judged_generator(forms_judge()).with_latency(Duration::from_millis(100));
    let store = InMemoryKnowledgeStore::new(
        FabricConfig::new().with_admission_mode(AdmissionMode::Serializable),
        Arc::new(generator),
    );
    store.seed("Users prefer long forms").await.unwrap();

    let (outcome, seeded) = tokio::join!(
        store.add_update(KnowledgeUpdate::append("Users like dark mode", "run 1")),
        async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            store.seed("Users prefer short forms").await
        },
    );

    assert_eq!(outcome.unwrap(), AdmissionOutcome::Appended);
    seeded.unwrap();
    // The admission was decided against the old baseline, which the seed then replaced.
    assert_eq!(store.full_content().await, "Users prefer short forms");
    assert!(store.updates(0, 10).await.is_empty());
}

#[tokio::test]
async fn seed_restores_baseline() {
    let store = store(AdmissionMode::Concurrent, forms_judge());
    store.seed("Base fact").await.unwrap();
    store
        .add_update(KnowledgeUpdate::append("Users prefer short forms", "r"))
        .await
        .unwrap();

    store.seed("Base fact").await.unwrap();

    assert_eq!(store.full_content().await, "Base fact");
    assert!(store.updates(0, 10).await.is_empty());
}

#[tokio::test]
async fn editor_tags_filter_history() {
    let store = store(AdmissionMode::Concurrent, forms_judge());
    let mut tags = Metadata::new();
    tags.insert("group_id".into(), "g1".into());
    tags.insert("persona_id".into(), "pm".into());

    store
        .add_update(KnowledgeUpdate::append("Users skim", "r").with_metadata(&tags))
        .await
        .unwrap();
    store
        .add_update(KnowledgeUpdate::append("Users skim", "r").with_tag("group_id", "g2"))
        .await
        .unwrap();

    let mut filter = Metadata::new();
    filter.insert("group_id".into(), "g1".into());
    let matched = store.updates_by_metadata(&filter).await;
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].metadata, tags);

    filter.insert("persona_id".into(), "other".into());
    assert!(store.updates_by_metadata(&filter).await.is_empty());
}

fn update_strategy() -> impl Strategy<Value = KnowledgeUpdate> {
    let text = prop_oneof![
        Just(String::new()),
        Just("  ".to_string()),
        Just("Users prefer short forms".to_string()),
        Just("Users prefer long forms".to_string()),
        "[a-z ]{1,12}",
    ];
    let old_text = prop_oneof![Just(String::new()), Just("Users prefer short forms".to_string())];
    let persona = prop_oneof![Just("pm"), Just("dev"), Just("")];

    (old_text, text, persona).prop_map(|(old, new, persona)| {
        let update = KnowledgeUpdate::replace(old, new, "generated");
        if persona.is_empty() {
            update
        } else {
            update.with_tag("persona_id", persona)
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn history_records_every_attempt(updates in prop::collection::vec(update_strategy(), 0..12)) {
        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        let mut pm = Metadata::new();
        pm.insert("persona_id".into(), "pm".into());

        let (history, everything, tagged) = rt.block_on(async {
            let store = store(AdmissionMode::Concurrent, forms_judge());
            for update in &updates {
                store.add_update(update.clone()).await.unwrap();
            }
            (
                store.updates(0, updates.len() + 1).await,
                store.updates_by_metadata(&Metadata::new()).await,
                store.updates_by_metadata(&pm).await,
            )
        });

        prop_assert_eq!(history.total, updates.len());
        prop_assert_eq!(&history.items, &updates);
        prop_assert_eq!(everything.len(), updates.len());

        let expected: Vec<_> = updates
            .iter()
            .filter(|u| u.metadata.get("persona_id").map(String::as_str) == Some("pm"))
            .cloned()
            .collect();
        prop_assert_eq!(tagged, expected);
    }
}
