// Request schemas for the owner endpoints, built once when the router is assembled.
use crate::database::models::ChaletUpdate;
use crate::validation::{general_field, FieldRule, ObjectRule, RequestSchema};

pub fn register() -> RequestSchema {
    RequestSchema::new().body(
        ObjectRule::keys()
            .field("username", FieldRule::string().min_length(1).max_length(50).required())
            .field("email", general_field("email"))
            .field("password", general_field("password")),
    )
}

pub fn login() -> RequestSchema {
    RequestSchema::new().body(
        ObjectRule::keys()
            .field("email", general_field("email"))
            .field("password", general_field("password")),
    )
}

pub fn update_reservation() -> RequestSchema {
    RequestSchema::new()
        .body(ObjectRule::keys().field("status", FieldRule::string().one_of(["accepted", "rejected"]).required()))
        .params(ObjectRule::keys().field("reservationId", general_field("id")))
}

/// Only allow-listed chalet fields may appear in the body.
pub fn edit_chalet() -> RequestSchema {
    let body = ObjectRule::keys()
        .field("name", FieldRule::string().max_length(100))
        .field("location", FieldRule::string().max_length(200))
        .field("description", FieldRule::string().max_length(2000))
        .field("pricing", FieldRule::number().min(0.0))
        .field("capacity", FieldRule::integer().min(1.0).max(1000.0))
        .field("amenities", FieldRule::array(FieldRule::string().max_length(100)).max_length(50));

    debug_assert!(body.field_names().eq(ChaletUpdate::FIELDS));

    RequestSchema::new()
        .body(body)
        .params(ObjectRule::keys().field("chaletId", general_field("id")))
}

pub fn upload_images() -> RequestSchema {
    RequestSchema::new().params(ObjectRule::keys().field("chaletId", general_field("id")))
}

pub fn owner_details() -> RequestSchema {
    RequestSchema::new().params(ObjectRule::keys().field("ownerId", general_field("id")))
}
