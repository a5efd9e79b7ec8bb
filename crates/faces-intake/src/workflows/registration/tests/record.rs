use serde_json::json;

use crate::workflows::registration::domain::{
    ApplicationRecord, FieldUpdate, LocationLevel, PhoneField, RatedSelection, SelectionList,
    TextField, DEFAULT_RATING,
};

fn location(level: LocationLevel, value: &str) -> FieldUpdate {
    FieldUpdate::Location {
        level,
        value: value.to_string(),
    }
}

#[test]
fn changing_a_parent_location_clears_descendants() {
    let mut record = ApplicationRecord::default();
    record.apply(location(LocationLevel::Governorate, "Beirut"));
    record.apply(location(LocationLevel::District, "Beirut"));
    record.apply(location(LocationLevel::Area, "Hamra"));

    record.apply(location(LocationLevel::District, "Beirut"));
    assert_eq!(record.location.area(), "Hamra", "same value keeps children");

    record.apply(location(LocationLevel::Governorate, "Mount Lebanon"));
    assert_eq!(record.location.governorate(), "Mount Lebanon");
    assert_eq!(record.location.district(), "");
    assert_eq!(record.location.area(), "");

    record.apply(location(LocationLevel::District, "Keserwan"));
    record.apply(location(LocationLevel::Area, "Jounieh"));
    record.apply(location(LocationLevel::District, "Matn"));
    assert_eq!(record.location.area(), "");
}

#[test]
fn adding_an_item_assigns_default_rating() {
    let mut record = ApplicationRecord::default();
    record.apply(FieldUpdate::Toggle {
        list: SelectionList::Talents,
        item: "Dancing".to_string(),
    });
    assert_eq!(record.skills.talents.items(), ["Dancing".to_string()]);
    assert_eq!(record.skills.talents.rating("Dancing"), Some(DEFAULT_RATING));
    assert_eq!(DEFAULT_RATING, 3);
}

#[test]
fn removing_an_item_deletes_its_rating() {
    let mut record = ApplicationRecord::default();
    record.apply(FieldUpdate::Selection {
        list: SelectionList::Sports,
        items: vec!["Swimming".to_string(), "Yoga".to_string()],
    });
    record.apply(FieldUpdate::Rating {
        list: SelectionList::Sports,
        item: "Yoga".to_string(),
        rating: 5,
    });
    record.apply(FieldUpdate::Toggle {
        list: SelectionList::Sports,
        item: "Yoga".to_string(),
    });

    assert!(!record.skills.sports.contains("Yoga"));
    assert_eq!(record.skills.sports.rating("Yoga"), None);
    assert_eq!(record.skills.sports.ratings().len(), 1);
}

#[test]
fn rating_unselected_item_is_ignored_and_ratings_clamp() {
    let mut record = ApplicationRecord::default();
    record.apply(FieldUpdate::Rating {
        list: SelectionList::Languages,
        item: "French".to_string(),
        rating: 4,
    });
    assert!(record.skills.languages.ratings().is_empty());

    record.apply(FieldUpdate::Selection {
        list: SelectionList::Languages,
        items: vec!["French".to_string()],
    });
    record.apply(FieldUpdate::Rating {
        list: SelectionList::Languages,
        item: "French".to_string(),
        rating: 9,
    });
    assert_eq!(record.skills.languages.rating("French"), Some(5));
    record.apply(FieldUpdate::Rating {
        list: SelectionList::Languages,
        item: "French".to_string(),
        rating: 0,
    });
    assert_eq!(record.skills.languages.rating("French"), Some(1));
}

#[test]
fn replacing_a_selection_keeps_surviving_ratings() {
    let mut selection = RatedSelection::default();
    selection.insert("Arabic");
    selection.insert("English");
    selection.set_rating("Arabic", 5);

    selection.replace(vec![
        "Arabic".to_string(),
        "French".to_string(),
        "Arabic".to_string(),
    ]);

    assert_eq!(selection.items(), ["Arabic".to_string(), "French".to_string()]);
    assert_eq!(selection.rating("Arabic"), Some(5));
    assert_eq!(selection.rating("French"), Some(DEFAULT_RATING));
    assert_eq!(selection.rating("English"), None);
}

#[test]
fn deserialized_selection_drops_orphan_ratings() {
    let selection: RatedSelection = serde_json::from_value(json!({
        "items": ["Acting"],
        "ratings": {"Acting": 4, "Singing": 2}
    }))
    .expect("selection parses");
    assert_eq!(selection.rating("Acting"), Some(4));
    assert_eq!(selection.rating("Singing"), None);
}

#[test]
fn phone_updates_keep_country_code() {
    let mut record = ApplicationRecord::default();
    record.apply(FieldUpdate::PhoneNumber {
        field: PhoneField::Mobile,
        value: "70123456".to_string(),
    });
    assert_eq!(
        record.phone(PhoneField::Mobile).formatted().as_deref(),
        Some("+961 70123456")
    );

    record.apply(FieldUpdate::CountryCode {
        field: PhoneField::Mobile,
        value: "+33".to_string(),
    });
    assert_eq!(
        record.phone(PhoneField::Mobile).formatted().as_deref(),
        Some("+33 70123456")
    );
    assert_eq!(record.phone(PhoneField::Whatsapp).formatted(), None);
}

#[test]
fn field_updates_use_tagged_json() {
    let update: FieldUpdate = serde_json::from_value(json!({
        "kind": "text",
        "field": "first_name",
        "value": "Maya"
    }))
    .expect("update parses");
    let mut record = ApplicationRecord::default();
    record.apply(update);
    assert_eq!(record.text(TextField::FirstName), "Maya");

    let update: FieldUpdate = serde_json::from_value(json!({
        "kind": "rating",
        "list": "languages",
        "item": "Arabic",
        "rating": 4
    }))
    .expect("rating parses");
    assert!(matches!(update, FieldUpdate::Rating { rating: 4, .. }));
}
