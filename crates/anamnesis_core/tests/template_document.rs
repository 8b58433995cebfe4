use anamnesis_core::{
    AnamnesisTemplate, DocumentError, QuestionType, QuestionUpdate, TemplateEditor,
};
use serde_json::json;

fn stored_document() -> serde_json::Value {
    json!({
        "id": "tpl-42",
        "name": "Avaliação Capilar",
        "type": "Capilar",
        "groups": [
            {
                "id": "g-a",
                "name": "Histórico",
                "questions": [
                    {
                        "id": "q-1",
                        "type": "yesno",
                        "text": "Usa medicação contínua?",
                        "required": true,
                        "order": 1
                    },
                    {
                        "id": "q-2",
                        "type": "dropdown",
                        "text": "Tipo de cabelo",
                        "required": false,
                        "order": 2,
                        "options": [
                            { "id": "o-1", "text": "Liso" },
                            { "id": "o-2", "text": "Cacheado" }
                        ]
                    },
                    {
                        "id": "q-3",
                        "type": "multiple_choice",
                        "text": "Tratamentos anteriores",
                        "required": false,
                        "order": 3,
                        "options": []
                    }
                ]
            }
        ]
    })
}

#[test]
fn hydrate_and_serialize_is_lossless() {
    let value = stored_document();
    let template: AnamnesisTemplate = serde_json::from_value(value.clone()).unwrap();
    let editor = TemplateEditor::hydrate(template).unwrap();

    assert!(editor.is_persisted());
    let back = serde_json::to_value(editor.template()).unwrap();
    assert_eq!(back, value);
}

#[test]
fn wire_fields_use_document_names() {
    let mut editor = TemplateEditor::with_header("Intake", "Geral");
    let group = editor.add_group();
    let question = editor.add_question(&group).unwrap();
    editor.update_question(
        &group,
        &question,
        QuestionUpdate::SetType(QuestionType::MultipleChoice),
    );

    let json = serde_json::to_value(editor.template()).unwrap();
    assert!(json.get("id").is_none());
    assert_eq!(json["type"], "Geral");
    let q = &json["groups"][0]["questions"][0];
    assert_eq!(q["type"], "multiple_choice");
    assert_eq!(q["order"], 1);
    assert_eq!(q["required"], false);
    assert_eq!(q["options"], json!([]));
}

#[test]
fn absent_options_stay_absent() {
    let template = AnamnesisTemplate::from_json(&stored_document().to_string()).unwrap();
    assert_eq!(template.groups[0].questions[0].options, None);

    let json: serde_json::Value = serde_json::from_str(&template.to_json().unwrap()).unwrap();
    assert!(json["groups"][0]["questions"][0].get("options").is_none());
}

#[test]
fn unknown_question_type_is_rejected() {
    let mut value = stored_document();
    value["groups"][0]["questions"][0]["type"] = json!("checkbox");

    let err = AnamnesisTemplate::from_json(&value.to_string()).unwrap_err();
    assert!(matches!(err, DocumentError::Json(_)));
}

fn question_ids_and_orders(editor: &TemplateEditor) -> (Vec<String>, Vec<u32>) {
    let questions = &editor.template().groups[0].questions;
    (
        questions.iter().map(|q| q.id.clone()).collect(),
        questions.iter().map(|q| q.order).collect(),
    )
}

#[test]
fn hydrate_closes_rank_gaps() {
    let mut value = stored_document();
    value["groups"][0]["questions"][1]["order"] = json!(5);
    value["groups"][0]["questions"][2]["order"] = json!(9);
    let template: AnamnesisTemplate = serde_json::from_value(value).unwrap();

    let editor = TemplateEditor::hydrate(template).unwrap();
    let (ids, orders) = question_ids_and_orders(&editor);
    assert_eq!(ids, vec!["q-1", "q-2", "q-3"]);
    assert_eq!(orders, vec![1, 2, 3]);
}

#[test]
fn hydrate_sorts_questions_by_stored_rank() {
    let mut value = stored_document();
    value["groups"][0]["questions"][0]["order"] = json!(2);
    value["groups"][0]["questions"][1]["order"] = json!(1);
    let template: AnamnesisTemplate = serde_json::from_value(value).unwrap();

    let editor = TemplateEditor::hydrate(template).unwrap();
    let (ids, orders) = question_ids_and_orders(&editor);
    assert_eq!(ids, vec!["q-2", "q-1", "q-3"]);
    assert_eq!(orders, vec![1, 2, 3]);

    let q1 = editor.template().group("g-a").unwrap().questions[1].clone();
    assert_eq!(q1.text, "Usa medicação contínua?");
    assert!(q1.required);
}

#[test]
fn hydrate_rejects_duplicate_option_ids() {
    let mut value = stored_document();
    value["groups"][0]["questions"][1]["options"][1]["id"] = json!("o-1");
    let template: AnamnesisTemplate = serde_json::from_value(value).unwrap();

    let err = TemplateEditor::hydrate(template).unwrap_err();
    assert!(matches!(err, DocumentError::DuplicateOptionId { .. }));
}

#[test]
fn edits_after_hydrate_behave_like_create_mode() {
    let template = AnamnesisTemplate::from_json(&stored_document().to_string()).unwrap();
    let mut editor = TemplateEditor::hydrate(template).unwrap();

    assert!(editor.delete_question("g-a", "q-1"));
    let group = editor.template().group("g-a").unwrap();
    let ids: Vec<&str> = group.questions.iter().map(|q| q.id.as_str()).collect();
    let orders: Vec<u32> = group.questions.iter().map(|q| q.order).collect();
    assert_eq!(ids, vec!["q-2", "q-3"]);
    assert_eq!(orders, vec![1, 2]);
}
