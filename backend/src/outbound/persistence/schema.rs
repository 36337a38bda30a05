//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` against a migrated database when a migration changes
//! a table.

diesel::table! {
    /// Accounts mirrored from the identity service.
    users (id) {
        /// Primary key.
        id -> Uuid,
        /// `user` or `admin`.
        role -> Varchar,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Service areas. `name` is unique.
    cities (id) {
        id -> Uuid,
        name -> Varchar,
        longitude -> Float8,
        latitude -> Float8,
        /// Containment radius in metres.
        radius_m -> Int4,
        /// IANA zone name resolved at registration.
        timezone -> Varchar,
        image_url -> Nullable<Varchar>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// User-to-city subscriptions. A non-null `deleted_at` marks an
    /// unsubscribed row that a later subscribe restores.
    city_subscriptions (user_id, city_id) {
        user_id -> Uuid,
        city_id -> Uuid,
        created_at -> Timestamptz,
        deleted_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Announced events. A null `city_id` marks a global event.
    events (id) {
        id -> Uuid,
        name -> Varchar,
        description -> Text,
        start_date -> Timestamptz,
        end_date -> Timestamptz,
        city_id -> Nullable<Uuid>,
        location -> Varchar,
        image_url -> Nullable<Varchar>,
        link_text -> Nullable<Varchar>,
        link_url -> Nullable<Varchar>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        /// Bumped when the event moves to another city and is re-announced.
        published_at -> Timestamptz,
    }
}

diesel::table! {
    /// Attendance answers, one per user and event.
    event_registrations (user_id, event_id) {
        user_id -> Uuid,
        event_id -> Uuid,
        going -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Stored read state (`seen` or `deleted`) per user and event message.
    message_interactions (user_id, event_id) {
        user_id -> Uuid,
        event_id -> Uuid,
        state -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Device push tokens and their provider endpoints. `token` is unique.
    push_tokens (id) {
        id -> Uuid,
        user_id -> Uuid,
        token -> Varchar,
        device_id -> Nullable<Varchar>,
        endpoint_arn -> Varchar,
        enabled -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Topic subscription ARNs recorded per push token.
    push_subscription_arns (push_token_id, arn) {
        push_token_id -> Uuid,
        user_id -> Uuid,
        arn -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Boards owned by riders.
    boards (serial_number) {
        serial_number -> Varchar,
        user_id -> Uuid,
        firmware_version -> Nullable<Varchar>,
    }
}

diesel::table! {
    /// Published firmware builds; the newest `released_at` is current.
    firmware_releases (version) {
        version -> Varchar,
        released_at -> Timestamptz,
    }
}

diesel::joinable!(city_subscriptions -> cities (city_id));
diesel::joinable!(events -> cities (city_id));
diesel::joinable!(event_registrations -> events (event_id));
diesel::joinable!(message_interactions -> events (event_id));
diesel::joinable!(push_subscription_arns -> push_tokens (push_token_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    cities,
    city_subscriptions,
    events,
    event_registrations,
    message_interactions,
    push_tokens,
    push_subscription_arns,
    boards,
    firmware_releases,
);
