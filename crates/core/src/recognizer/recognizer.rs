use super::field_tables::{
    DEVICE_FIELDS, DOMAIN_FIELDS, EMAIL_FIELDS, FILE_PATH_FIELDS, HASH_FIELDS, IP_FIELDS,
    PROCESS_FIELDS, URL_FIELDS, USERNAME_FIELDS,
};
use super::patterns::{
    DOMAIN_PATTERN, EMAIL_PATTERN, HASH_MD5_PATTERN, HASH_SHA1_PATTERN, HASH_SHA256_PATTERN,
    IP_PATTERN, URL_PATTERN,
};
use super::validators::{
    domain_from_url, file_extension, hash_type_from_length, is_private_ip, is_system_account,
    is_system_file, is_valid_domain, is_valid_email, is_valid_file_path, is_valid_hash,
    is_valid_url, is_valid_username, parse_ip, process_name_from, top_level_domain,
};
use crate::entity::{Entity, EntityKey, EntityType};
use std::collections::HashSet;
use tracing::instrument;
use uuid::Uuid;

/// Extracts entities from a raw log payload in two passes: structured-field
/// probing, then free-text regex scanning of the flattened payload
/// (SPEC_FULL.md §4.1). Total: a malformed field is skipped, never fatal.
#[derive(Debug, Default, Clone, Copy)]
pub struct Recognizer;

impl Recognizer {
    pub fn new() -> Self {
        Self
    }

    #[instrument(skip(self, payload), fields(event_id = %event_id))]
    pub fn extract_entities(&self, payload: &serde_json::Value, event_id: Uuid) -> Vec<Entity> {
        let mut entities = Vec::new();
        let mut seen: HashSet<EntityKey> = HashSet::new();

        self.extract_ip(payload, &mut entities, &mut seen);
        self.extract_username(payload, &mut entities, &mut seen);
        self.extract_file(payload, &mut entities, &mut seen);
        self.extract_process(payload, &mut entities, &mut seen);
        self.extract_device(payload, &mut entities, &mut seen);
        self.extract_domain(payload, &mut entities, &mut seen);
        self.extract_email(payload, &mut entities, &mut seen);
        self.extract_url(payload, &mut entities, &mut seen);
        self.extract_hash(payload, &mut entities, &mut seen);

        let is_anomaly = payload.get("is_anomaly").cloned();
        let anomaly_type = payload.get("anomaly_type").cloned();

        for entity in &mut entities {
            entity.add_metadata("source_event_id", event_id.to_string());
            entity.add_metadata("extraction_timestamp", chrono::Utc::now().to_rfc3339());
            if let Some(flag) = &is_anomaly {
                entity.add_metadata("is_anomaly", flag.clone());
            }
            if let Some(anomaly_type) = &anomaly_type {
                entity.add_metadata("anomaly_type", anomaly_type.clone());
            }
        }

        entities
    }

    fn push(&self, entities: &mut Vec<Entity>, seen: &mut HashSet<EntityKey>, mut entity: Entity) {
        let key = entity.key();
        if seen.insert(key) {
            entity.touch();
            entities.push(entity);
        }
    }

    fn flattened_text(&self, payload: &serde_json::Value) -> String {
        payload.to_string()
    }

    fn str_field<'a>(&self, payload: &'a serde_json::Value, field: &str) -> Option<&'a str> {
        payload.get(field).and_then(|v| v.as_str())
    }

    fn extract_ip(&self, payload: &serde_json::Value, entities: &mut Vec<Entity>, seen: &mut HashSet<EntityKey>) {
        for &field in IP_FIELDS {
            let Some(raw) = self.str_field(payload, field) else { continue };
            let Some(ip) = parse_ip(raw) else { continue };

            let mut entity = Entity::new(EntityType::Ip, ip.to_string());
            entity.add_metadata("field_source", field);
            entity.add_metadata("is_private", is_private_ip(&ip));
            self.push(entities, seen, entity);
        }

        let text = self.flattened_text(payload);
        for m in IP_PATTERN.find_iter(&text) {
            let raw = m.as_str();
            let Some(ip) = parse_ip(raw) else { continue };

            let mut entity = Entity::new(EntityType::Ip, ip.to_string());
            entity.add_metadata("field_source", "text_extraction");
            entity.add_metadata("is_private", is_private_ip(&ip));
            self.push(entities, seen, entity);
        }
    }

    fn extract_username(&self, payload: &serde_json::Value, entities: &mut Vec<Entity>, seen: &mut HashSet<EntityKey>) {
        for &field in USERNAME_FIELDS {
            let Some(raw) = self.str_field(payload, field) else { continue };
            let username = raw.trim();
            if username.is_empty() || !is_valid_username(username) {
                continue;
            }

            let mut entity = Entity::new(EntityType::User, username);
            entity.add_metadata("field_source", field);
            entity.add_metadata("is_system_account", is_system_account(username));
            self.push(entities, seen, entity);
        }
    }

    fn extract_file(&self, payload: &serde_json::Value, entities: &mut Vec<Entity>, seen: &mut HashSet<EntityKey>) {
        for &field in FILE_PATH_FIELDS {
            let Some(raw) = self.str_field(payload, field) else { continue };
            let path = raw.trim();
            if path.is_empty() || !is_valid_file_path(path) {
                continue;
            }

            let mut entity = Entity::new(EntityType::File, path);
            entity.add_metadata("field_source", field);
            entity.add_metadata("is_system_file", is_system_file(path));
            if let Some(ext) = file_extension(path) {
                entity.add_metadata("file_extension", ext);
            }
            self.push(entities, seen, entity);
        }
    }

    fn extract_process(&self, payload: &serde_json::Value, entities: &mut Vec<Entity>, seen: &mut HashSet<EntityKey>) {
        for &field in PROCESS_FIELDS {
            let Some(raw) = self.str_field(payload, field) else { continue };
            let process_info = raw.trim();
            if process_info.is_empty() {
                continue;
            }

            let process_name = process_name_from(process_info);
            if process_name.is_empty() {
                continue;
            }

            let mut entity = Entity::new(EntityType::Process, process_name);
            entity.add_metadata("field_source", field);
            if field == "command_line" {
                entity.add_metadata("full_command", process_info);
            }
            self.push(entities, seen, entity);
        }
    }

    fn extract_device(&self, payload: &serde_json::Value, entities: &mut Vec<Entity>, seen: &mut HashSet<EntityKey>) {
        for &field in DEVICE_FIELDS {
            let Some(raw) = self.str_field(payload, field) else { continue };
            let hostname = raw.trim().to_lowercase();
            if hostname.is_empty() {
                continue;
            }

            let mut entity = Entity::new(EntityType::Device, hostname);
            entity.add_metadata("field_source", field);
            self.push(entities, seen, entity);
        }
    }

    fn extract_domain(&self, payload: &serde_json::Value, entities: &mut Vec<Entity>, seen: &mut HashSet<EntityKey>) {
        for &field in DOMAIN_FIELDS {
            let Some(raw) = self.str_field(payload, field) else { continue };
            let domain = raw.trim().to_lowercase();
            if domain.is_empty() || !is_valid_domain(&domain) {
                continue;
            }

            let mut entity = Entity::new(EntityType::Domain, domain.clone());
            entity.add_metadata("field_source", field);
            if let Some(tld) = top_level_domain(&domain) {
                entity.add_metadata("tld", tld);
            }
            self.push(entities, seen, entity);
        }

        let text = self.flattened_text(payload);
        for m in DOMAIN_PATTERN.find_iter(&text) {
            let domain = m.as_str().to_lowercase();
            if !is_valid_domain(&domain) {
                continue;
            }

            let mut entity = Entity::new(EntityType::Domain, domain.clone());
            entity.add_metadata("field_source", "text_extraction");
            if let Some(tld) = top_level_domain(&domain) {
                entity.add_metadata("tld", tld);
            }
            self.push(entities, seen, entity);
        }
    }

    fn extract_email(&self, payload: &serde_json::Value, entities: &mut Vec<Entity>, seen: &mut HashSet<EntityKey>) {
        for &field in EMAIL_FIELDS {
            let Some(raw) = self.str_field(payload, field) else { continue };
            let email = raw.trim().to_lowercase();
            if email.is_empty() || !is_valid_email(&email) {
                continue;
            }

            let mut entity = Entity::new(EntityType::Email, email.clone());
            entity.add_metadata("field_source", field);
            if let Some((_, domain)) = email.split_once('@') {
                entity.add_metadata("domain", domain);
            }
            self.push(entities, seen, entity);
        }

        let text = self.flattened_text(payload);
        for m in EMAIL_PATTERN.find_iter(&text) {
            let email = m.as_str().to_lowercase();
            if !is_valid_email(&email) {
                continue;
            }

            let mut entity = Entity::new(EntityType::Email, email.clone());
            entity.add_metadata("field_source", "text_extraction");
            if let Some((_, domain)) = email.split_once('@') {
                entity.add_metadata("domain", domain);
            }
            self.push(entities, seen, entity);
        }
    }

    fn extract_url(&self, payload: &serde_json::Value, entities: &mut Vec<Entity>, seen: &mut HashSet<EntityKey>) {
        for &field in URL_FIELDS {
            let Some(raw) = self.str_field(payload, field) else { continue };
            let url = raw.trim();
            if url.is_empty() || !is_valid_url(url) {
                continue;
            }

            let mut entity = Entity::new(EntityType::Url, url);
            entity.add_metadata("field_source", field);
            if let Some(domain) = domain_from_url(url) {
                entity.add_metadata("domain", domain);
            }
            if let Some((scheme, _)) = url.split_once("://") {
                entity.add_metadata("scheme", scheme);
            }
            self.push(entities, seen, entity);
        }

        let text = self.flattened_text(payload);
        for m in URL_PATTERN.find_iter(&text) {
            let url = m.as_str();
            if !is_valid_url(url) {
                continue;
            }

            let mut entity = Entity::new(EntityType::Url, url);
            entity.add_metadata("field_source", "text_extraction");
            if let Some(domain) = domain_from_url(url) {
                entity.add_metadata("domain", domain);
            }
            if let Some((scheme, _)) = url.split_once("://") {
                entity.add_metadata("scheme", scheme);
            }
            self.push(entities, seen, entity);
        }
    }

    /// Hashes are modeled as `File` entities with `is_hash = true` metadata
    /// (SPEC_FULL.md §3).
    fn extract_hash(&self, payload: &serde_json::Value, entities: &mut Vec<Entity>, seen: &mut HashSet<EntityKey>) {
        for &field in HASH_FIELDS {
            let Some(raw) = self.str_field(payload, field) else { continue };
            let hash_value = raw.trim().to_lowercase();
            if hash_value.is_empty() || !is_valid_hash(&hash_value) {
                continue;
            }

            let Some(hash_type) = hash_type_from_length(&hash_value) else { continue };
            let mut entity = Entity::new(EntityType::File, hash_value);
            entity.add_metadata("field_source", field);
            entity.add_metadata("hash_type", hash_type.as_str());
            entity.add_metadata("is_hash", true);
            self.push(entities, seen, entity);
        }

        let text = self.flattened_text(payload);
        for (pattern, hash_type_str) in [
            (&*HASH_MD5_PATTERN, "MD5"),
            (&*HASH_SHA1_PATTERN, "SHA1"),
            (&*HASH_SHA256_PATTERN, "SHA256"),
        ] {
            for m in pattern.find_iter(&text) {
                let hash_value = m.as_str().to_lowercase();
                let mut entity = Entity::new(EntityType::File, hash_value);
                entity.add_metadata("field_source", "text_extraction");
                entity.add_metadata("hash_type", hash_type_str);
                entity.add_metadata("is_hash", true);
                self.push(entities, seen, entity);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_ip_and_username_from_structured_fields() {
        let payload = json!({"src_ip": "10.1.2.3", "username": "alice"});
        let entities = Recognizer::new().extract_entities(&payload, Uuid::new_v4());

        assert!(entities.iter().any(|e| e.entity_type == EntityType::Ip && e.entity_id == "10.1.2.3"));
        assert!(entities.iter().any(|e| e.entity_type == EntityType::User && e.entity_id == "alice"));
    }

    #[test]
    fn dedupes_same_key_across_passes() {
        let payload = json!({"src_ip": "8.8.8.8", "message": "connection from 8.8.8.8 refused"});
        let entities = Recognizer::new().extract_entities(&payload, Uuid::new_v4());

        let ip_count = entities
            .iter()
            .filter(|e| e.entity_type == EntityType::Ip && e.entity_id == "8.8.8.8")
            .count();
        assert_eq!(ip_count, 1);
    }

    #[test]
    fn rejects_placeholder_username() {
        let payload = json!({"username": "guest"});
        let entities = Recognizer::new().extract_entities(&payload, Uuid::new_v4());
        assert!(entities.iter().all(|e| e.entity_type != EntityType::User));
    }

    #[test]
    fn hash_field_emits_file_entity_with_is_hash_flag() {
        let payload = json!({"sha256": "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"});
        let entities = Recognizer::new().extract_entities(&payload, Uuid::new_v4());

        let hash_entity = entities.iter().find(|e| e.entity_type == EntityType::File).unwrap();
        assert_eq!(hash_entity.metadata.get("hash_type").unwrap(), "SHA256");
        assert_eq!(hash_entity.metadata.get("is_hash").unwrap(), true);
    }

    #[test]
    fn stamps_event_level_anomaly_flags_onto_every_entity() {
        let payload = json!({
            "src_ip": "203.0.113.99",
            "username": "alice",
            "is_anomaly": true,
            "anomaly_type": "unusual_data_transfer",
        });
        let entities = Recognizer::new().extract_entities(&payload, Uuid::new_v4());

        assert!(!entities.is_empty());
        for entity in &entities {
            assert_eq!(entity.metadata.get("is_anomaly").unwrap(), true);
            assert_eq!(entity.metadata.get("anomaly_type").unwrap(), "unusual_data_transfer");
        }
    }

    #[test]
    fn empty_payload_yields_no_entities() {
        let payload = json!({});
        let entities = Recognizer::new().extract_entities(&payload, Uuid::new_v4());
        assert!(entities.is_empty());
    }
}
