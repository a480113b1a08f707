//! End-to-end scenarios against the public engine surface

use souschef::engine::{EngineConfig, SessionEngine};
use souschef::error::Error;
use souschef::materialize::materialize;
use souschef::ops::{InsertIngredient, OperationBatch, OperationKind, RawOperation};
use souschef::recipe::{
    EquipmentId, IngredientId, InstructionStep, Recipe, RecipeId, StepEquipment, StepId,
    StepIngredient,
};
use souschef::render::TemplateRenderer;
use std::sync::Arc;

fn ingredient(key: &str, name: &str, amount: f64, unit: &str) -> StepIngredient {
    StepIngredient {
        placeholder_key: key.to_string(),
        ingredient_id: IngredientId::from_string(name.replace(' ', "-")),
        name: name.to_string(),
        amount,
        unit: unit.to_string(),
    }
}

fn equipment(key: &str, name: &str) -> StepEquipment {
    StepEquipment {
        placeholder_key: key.to_string(),
        equipment_id: EquipmentId::from_string(name.replace(' ', "-")),
        name: name.to_string(),
    }
}

fn step(
    order_index: u32,
    short: &str,
    detail: &str,
    ingredients: Vec<StepIngredient>,
    equipment: Vec<StepEquipment>,
) -> InstructionStep {
    InstructionStep {
        id: StepId::new(),
        order_index,
        short_text: short.to_string(),
        detailed_description: detail.to_string(),
        ingredients,
        equipment,
    }
}

fn vegan_chili() -> Recipe {
    Recipe {
        id: RecipeId::from_string("recipe-vegan-chili".to_string()),
        title: "Vegan Chili".to_string(),
        description: Some("Hearty, spicy, and packed with beans".to_string()),
        base_pax: 6,
        prep_time_minutes: 20,
        cook_time_minutes: 90,
        steps: vec![
            step(
                0,
                "Mise en Place",
                "Dice {i:onion} (medium). Mince {i:garlic:qty} and {i:jalapeno}. \
                 Measure spices ({i:chili_powder:qty}, {i:cumin:qty}, {i:paprika:qty}) \
                 into a small bowl.",
                vec![
                    ingredient("onion", "onion", 1.0, "large"),
                    ingredient("garlic", "garlic", 6.0, "clove"),
                    ingredient("jalapeno", "jalapeño", 2.0, "whole"),
                    ingredient("chili_powder", "chili powder", 3.0, "tbsp"),
                    ingredient("cumin", "cumin", 1.0, "tbsp"),
                    ingredient("paprika", "smoked paprika", 1.5, "tsp"),
                ],
                vec![equipment("knife", "knife"), equipment("cutting_board", "cutting board")],
            ),
            step(
                1,
                "Sauté Aromatics",
                "Heat {i:oil:qty} in the {e:dutch_oven} over medium heat. Sauté diced \
                 {i:onion} until translucent (5-7 mins). Add minced {i:garlic} and \
                 {i:jalapeno}, cook 1 min until fragrant.",
                vec![
                    ingredient("oil", "olive oil", 2.0, "tbsp"),
                    ingredient("onion", "onion", 1.0, "large"),
                    ingredient("garlic", "garlic", 6.0, "clove"),
                    ingredient("jalapeno", "jalapeño", 2.0, "whole"),
                ],
                vec![equipment("dutch_oven", "dutch oven")],
            ),
            step(
                2,
                "Bloom Spices",
                "Stir in {i:tomato_paste:qty} and the spice mixture. Cook stirring \
                 constantly with the {e:wooden_spoon} for 2 mins until spices darken.",
                vec![ingredient("tomato_paste", "tomato paste", 2.0, "tbsp")],
                vec![equipment("wooden_spoon", "wooden spoon")],
            ),
            step(
                3,
                "Simmer",
                "Deglaze with a splash of {i:broth}. Add {i:tomatoes:qty}, rinsed \
                 {i:kidney_beans} and {i:pinto_beans}, and remaining {i:broth}.",
                vec![
                    ingredient("broth", "vegetable broth", 2.0, "cup"),
                    ingredient("tomatoes", "crushed tomatoes", 28.0, "oz"),
                    ingredient("kidney_beans", "kidney beans", 2.0, "can"),
                    ingredient("pinto_beans", "pinto beans", 2.0, "can"),
                ],
                vec![],
            ),
            step(
                4,
                "Cook",
                "Bring to a boil in the {e:dutch_oven}, then reduce heat to low. Simmer \
                 uncovered for 45-60 mins until thickened.",
                vec![],
                vec![equipment("dutch_oven", "dutch oven")],
            ),
            step(5, "Finish", "Season with salt to taste. Serve hot.", vec![], vec![]),
        ],
    }
}

fn raw(kind: OperationKind) -> RawOperation {
    RawOperation {
        operation: kind,
        step_index: None,
        step_id: None,
        short_text: None,
        detailed_description: None,
        placeholder_key: None,
        new_amount: None,
        new_ingredient_id: None,
        new_ingredient_name: None,
        substitution_note: None,
        agent_notes: None,
        ingredients: None,
        equipment: None,
    }
}

fn batch(operations: Vec<RawOperation>, message: &str) -> OperationBatch {
    OperationBatch {
        operations,
        agent_message: message.to_string(),
        time_impact_minutes: 5.0,
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn order_indices(session: &souschef::session::CookingSession) -> Vec<u32> {
    let mut indices: Vec<u32> = session.steps.iter().map(|s| s.order_index).collect();
    indices.sort_unstable();
    indices
}

// Scenario A: rendering at pax 1.0 resolves names and quantities
#[test]
fn scenario_a_render_at_base_pax() {
    let session = materialize(&vegan_chili(), 1.0).unwrap();
    let renderer = TemplateRenderer::new();

    let text = renderer.render_step(&session.steps[0]).unwrap();
    assert!(text.contains("onion"));
    assert!(text.contains("6 clove garlic"));
    assert!(!text.contains('{'));
}

// Scenario B: doubling pax doubles rendered quantities
#[test]
fn scenario_b_render_at_double_pax() {
    let session = materialize(&vegan_chili(), 2.0).unwrap();
    let renderer = TemplateRenderer::new();

    let text = renderer.render_step(&session.steps[1]).unwrap();
    assert!(text.contains("4 tbsp olive oil"));
}

// Scenario C: inserting behind the cursor is rejected and mutates nothing
#[tokio::test]
async fn scenario_c_insert_behind_cursor_rejected() {
    let engine = SessionEngine::new(EngineConfig::default(), None);
    let id = engine.create_session(&vegan_chili(), 1.0).await.unwrap();
    engine.start_session(&id).await.unwrap();
    engine.advance(&id).await.unwrap();
    engine.advance(&id).await.unwrap();

    let before = engine.snapshot(&id).await.unwrap();
    assert_eq!(before.current_step_index, 2);

    let mut insert = raw(OperationKind::Insert);
    insert.step_index = Some(1);
    insert.short_text = Some("Redo Aromatics".to_string());
    insert.detailed_description = Some("Sauté fresh aromatics.".to_string());

    let err = engine
        .apply_batch(&id, &batch(vec![insert], "Let me add a recovery step."))
        .await
        .unwrap_err();
    match err {
        Error::ValidationFailed { op_index, source } => {
            assert_eq!(op_index, 0);
            assert!(matches!(*source, Error::InvalidPosition { position: 1, .. }));
        }
        other => panic!("unexpected error: {other}"),
    }

    let after = engine.snapshot(&id).await.unwrap();
    assert_eq!(
        serde_json::to_string(&after.steps).unwrap(),
        serde_json::to_string(&before.steps).unwrap()
    );
    assert!(engine.modifications(&id).await.unwrap().is_empty());
}

// Scenario D: substitution changes identity, note, and rendered text
#[tokio::test]
async fn scenario_d_substitute_broth() {
    let engine = SessionEngine::new(EngineConfig::default(), None);
    let id = engine.create_session(&vegan_chili(), 1.0).await.unwrap();
    engine.start_session(&id).await.unwrap();

    let simmer = engine.snapshot(&id).await.unwrap().steps[3].clone();
    let mut substitute = raw(OperationKind::Substitute);
    substitute.step_id = Some(simmer.id.as_str().to_string());
    substitute.placeholder_key = Some("broth".to_string());
    substitute.new_ingredient_id = Some("beef-broth".to_string());
    substitute.substitution_note = Some("Using beef broth for a meat chili.".to_string());

    let result = engine
        .apply_batch(&id, &batch(vec![substitute], "Switching to beef broth."))
        .await
        .unwrap();
    assert!(result.applied);

    let text = engine.render_step_at(&id, 3).await.unwrap();
    assert!(text.contains("beef broth"));
    assert!(!text.contains("vegetable broth"));

    let session = engine.snapshot(&id).await.unwrap();
    let binding = session.step(&simmer.id).unwrap().ingredient("broth").unwrap();
    assert!(binding.is_substitution);
    assert_eq!(
        binding.ingredient_id,
        IngredientId::from_string("beef-broth".to_string())
    );
    assert_eq!(
        binding.substitution_note.as_deref(),
        Some("Using beef broth for a meat chili.")
    );
}

// Scenario E: concurrent batches on one session serialize and keep the
// order-index invariant
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn scenario_e_concurrent_batches_serialize() {
    init_tracing();
    let engine = Arc::new(SessionEngine::new(EngineConfig::default(), None));
    let id = engine.create_session(&vegan_chili(), 1.0).await.unwrap();
    engine.start_session(&id).await.unwrap();

    let mut handles = Vec::new();
    for n in 0..2 {
        let engine = engine.clone();
        let id = id.clone();
        handles.push(tokio::spawn(async move {
            let mut insert = raw(OperationKind::Insert);
            insert.step_index = Some(1);
            insert.short_text = Some(format!("Recovery {n}"));
            insert.detailed_description = Some("Prep fresh replacements.".to_string());
            engine
                .apply_batch(&id, &batch(vec![insert], "Recovering."))
                .await
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().unwrap().applied);
    }

    let session = engine.snapshot(&id).await.unwrap();
    assert_eq!(session.steps.len(), 8);
    assert_eq!(order_indices(&session), (0..8).collect::<Vec<u32>>());
    assert_eq!(engine.modifications(&id).await.unwrap().len(), 2);
}

// An inserted step whose bindings repeat a placeholder key never commits
#[tokio::test]
async fn insert_with_repeated_placeholder_key_rejected() {
    let engine = SessionEngine::new(EngineConfig::default(), None);
    let id = engine.create_session(&vegan_chili(), 1.0).await.unwrap();
    engine.start_session(&id).await.unwrap();

    let mut insert = raw(OperationKind::Insert);
    insert.step_index = Some(4);
    insert.short_text = Some("Top Up Liquid".to_string());
    insert.detailed_description = Some("Add {i:broth:qty} if the chili looks dry.".to_string());
    insert.ingredients = Some(vec![
        InsertIngredient {
            placeholder_key: "broth".to_string(),
            ingredient_id: IngredientId::from_string("vegetable-broth".to_string()),
            name: "vegetable broth".to_string(),
            amount: 1.0,
            unit: "cup".to_string(),
        },
        InsertIngredient {
            placeholder_key: "broth".to_string(),
            ingredient_id: IngredientId::from_string("beef-broth".to_string()),
            name: "beef broth".to_string(),
            amount: 1.0,
            unit: "cup".to_string(),
        },
    ]);

    let err = engine
        .apply_batch(&id, &batch(vec![insert], "Adding liquid."))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::ValidationFailed { op_index: 0, ref source }
            if matches!(**source, Error::DuplicatePlaceholderKey(ref key) if key == "broth")
    ));

    let session = engine.snapshot(&id).await.unwrap();
    assert_eq!(session.steps.len(), 6);
    assert!(engine.modifications(&id).await.unwrap().is_empty());
}

// Completed and abandoned sessions accept no further batches
#[tokio::test]
async fn terminal_session_rejects_batches() {
    let engine = SessionEngine::new(EngineConfig::default(), None);
    let id = engine.create_session(&vegan_chili(), 1.0).await.unwrap();
    engine.start_session(&id).await.unwrap();
    engine.abandon(&id).await.unwrap();

    let target = engine.snapshot(&id).await.unwrap().steps[5].id.clone();
    let mut skip = raw(OperationKind::Skip);
    skip.step_id = Some(target.as_str().to_string());

    let err = engine
        .apply_batch(&id, &batch(vec![skip], "Skipping the finish."))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SessionNotActive(_)));
    assert!(engine.snapshot(&id).await.unwrap().steps.iter().all(|s| !s.is_skipped));
}

// A full burnt-onion recovery batch: insert two prep steps and update a
// later step, all in one atomic unit
#[tokio::test]
async fn burnt_onion_recovery_batch() {
    let engine = SessionEngine::new(EngineConfig::default(), None);
    let id = engine.create_session(&vegan_chili(), 1.0).await.unwrap();
    engine.start_session(&id).await.unwrap();
    engine.advance(&id).await.unwrap();
    engine.advance(&id).await.unwrap();

    let bloom = engine.snapshot(&id).await.unwrap().steps[2].clone();

    let mut clean = raw(OperationKind::Insert);
    clean.step_index = Some(2);
    clean.short_text = Some("Clean the Pot".to_string());
    clean.detailed_description = Some("Discard the burnt onions and wipe out the pot.".to_string());

    let mut resaute = raw(OperationKind::Insert);
    resaute.step_index = Some(3);
    resaute.short_text = Some("Re-Sauté Aromatics".to_string());
    resaute.detailed_description = Some("Sauté the fresh onion until translucent.".to_string());

    let mut update = raw(OperationKind::Update);
    update.step_id = Some(bloom.id.as_str().to_string());
    update.detailed_description = Some(
        "Stir in {i:tomato_paste:qty} and the spice mixture once the fresh aromatics \
         are ready."
            .to_string(),
    );

    let result = engine
        .apply_batch(
            &id,
            &batch(
                vec![clean, resaute, update],
                "Burnt onions happen! Let's recover.",
            ),
        )
        .await
        .unwrap();
    assert!(result.applied);
    assert_eq!(result.operations_applied.len(), 3);

    let session = engine.snapshot(&id).await.unwrap();
    assert_eq!(session.steps.len(), 8);
    assert_eq!(order_indices(&session), (0..8).collect::<Vec<u32>>());
    assert_eq!(session.steps[2].short_text, "Clean the Pot");
    assert_eq!(session.steps[3].short_text, "Re-Sauté Aromatics");
    // the bloom step shifted down by two and took the update
    let bloom_after = session.step(&bloom.id).unwrap();
    assert_eq!(bloom_after.order_index, 4);
    assert!(bloom_after.detailed_description.contains("fresh aromatics"));

    let log = engine.modifications(&id).await.unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].modification_type, "batch");
    assert_eq!(log[0].changes_made.len(), 3);
}
