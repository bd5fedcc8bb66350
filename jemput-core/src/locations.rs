//! Pickup locations: the built-in West Java city list plus custom entries.

use tracing::info;

use crate::model::{Location, LocationId, User};
use crate::service::{JemputService, ServiceError};

#[derive(Debug, Clone, Copy, PartialEq)]
/// A built-in city with its centre coordinates.
pub struct City {
    /// Name offered in the waste form.
    pub name: &'static str,
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
}

const fn city(name: &'static str, latitude: f64, longitude: f64) -> City {
    City {
        name,
        latitude,
        longitude,
    }
}

/// Cities and regencies of West Java, in the order the waste form lists them.
pub const WEST_JAVA_CITIES: [City; 27] = [
    city("Kota Bandung", -6.9175, 107.6191),
    city("Kab. Bandung", -7.0252, 107.5197),
    city("Kab. Bandung Barat", -6.8279, 107.4566),
    city("Kota Bogor", -6.5971, 106.8060),
    city("Kab. Bogor", -6.5518, 106.6291),
    city("Kota Bekasi", -6.2383, 106.9756),
    city("Kab. Bekasi", -6.3642, 107.1724),
    city("Kota Depok", -6.4025, 106.7942),
    city("Kota Cimahi", -6.8722, 107.5422),
    city("Kota Tasikmalaya", -7.3274, 108.2207),
    city("Kab. Tasikmalaya", -7.3595, 108.1065),
    city("Kota Sukabumi", -6.9277, 106.9299),
    city("Kab. Sukabumi", -6.9890, 106.8159),
    city("Kota Cirebon", -6.7320, 108.5523),
    city("Kab. Cirebon", -6.7570, 108.4800),
    city("Kota Banjar", -7.3745, 108.5583),
    city("Kab. Cianjur", -6.8206, 107.1429),
    city("Kab. Garut", -7.2279, 107.9087),
    city("Kab. Indramayu", -6.3268, 108.3207),
    city("Kab. Karawang", -6.3013, 107.2917),
    city("Kab. Kuningan", -6.9769, 108.4813),
    city("Kab. Majalengka", -6.8364, 108.2278),
    city("Kab. Pangandaran", -7.7013, 108.4950),
    city("Kab. Purwakarta", -6.5564, 107.4428),
    city("Kab. Subang", -6.5716, 107.7587),
    city("Kab. Sumedang", -6.8586, 107.9266),
    city("Kab. Ciamis", -7.3262, 108.3537),
];

/// Parse a typed coordinate, accepting either `.` or `,` as decimal separator.
#[must_use]
pub fn parse_coordinate(raw: &str) -> Option<f64> {
    raw.trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

#[derive(Debug, Clone)]
/// Location as submitted by the location form.
pub struct LocationDraft {
    /// Existing location being edited, or `None` to create one.
    pub id: Option<LocationId>,
    /// Display name.
    pub name: String,
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Free text description.
    pub note: String,
}

impl JemputService {
    /// Custom locations ordered by name.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Store`] when the read fails.
    pub async fn list_locations(&self) -> Result<Vec<Location>, ServiceError> {
        let mut locations = self.stores.locations.all_locations().await?;
        locations.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(locations)
    }

    /// Names offered by the waste form: built-in cities first, then custom
    /// locations whose name is not already listed.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Store`] when the read fails.
    pub async fn location_choices(&self) -> Result<Vec<String>, ServiceError> {
        let mut choices: Vec<String> = WEST_JAVA_CITIES
            .iter()
            .map(|city| city.name.to_owned())
            .collect();
        for location in self.list_locations().await? {
            if !choices.iter().any(|name| name.eq_ignore_ascii_case(&location.name)) {
                choices.push(location.name);
            }
        }
        Ok(choices)
    }

    /// Validate and store a custom location.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Forbidden`] for regular accounts,
    /// [`ServiceError::Validation`] for a blank name or coordinates outside
    /// the valid range, and [`ServiceError::Store`] when the write fails.
    pub async fn save_location(
        &self,
        actor: &User,
        draft: LocationDraft,
    ) -> Result<Location, ServiceError> {
        if !actor.role.can_manage_records() {
            return Err(ServiceError::Forbidden);
        }
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(ServiceError::Validation(
                "name, latitude and longitude are required".into(),
            ));
        }
        if !(-90.0..=90.0).contains(&draft.latitude) {
            return Err(ServiceError::Validation(
                "latitude must be between -90 and 90".into(),
            ));
        }
        if !(-180.0..=180.0).contains(&draft.longitude) {
            return Err(ServiceError::Validation(
                "longitude must be between -180 and 180".into(),
            ));
        }

        let existing_id = draft.id.filter(|id| !id.0.trim().is_empty());
        let created = existing_id.is_none();
        let location = Location {
            id: existing_id.unwrap_or_else(|| LocationId(self.stores.ids.next_id())),
            name: name.to_owned(),
            latitude: draft.latitude,
            longitude: draft.longitude,
            note: draft.note.trim().to_owned(),
        };

        if created {
            self.stores.locations.insert_location(location.clone()).await?;
        } else {
            self.stores.locations.replace_location(location.clone()).await?;
        }
        info!(
            location_id = %location.id,
            name = %location.name,
            actor = %actor.username,
            created,
            "location saved"
        );
        Ok(location)
    }

    /// Delete a custom location. Wastes keep the name they were recorded with.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Forbidden`] for regular accounts and
    /// [`ServiceError::Store`] when the delete fails.
    pub async fn delete_location(&self, actor: &User, id: &LocationId) -> Result<(), ServiceError> {
        if !actor.role.can_manage_records() {
            return Err(ServiceError::Forbidden);
        }
        self.stores.locations.delete_location(id).await?;
        info!(location_id = %id, actor = %actor.username, "location deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_accept_comma_decimals() {
        assert_eq!(parse_coordinate(" -6,9175 "), Some(-6.9175));
        assert_eq!(parse_coordinate("107.6191"), Some(107.6191));
        assert_eq!(parse_coordinate("utara"), None);
        assert_eq!(parse_coordinate(""), None);
        assert_eq!(parse_coordinate("NaN"), None);
    }

    #[test]
    fn city_list_starts_with_bandung_and_has_unique_names() {
        assert_eq!(WEST_JAVA_CITIES.first().map(|city| city.name), Some("Kota Bandung"));
        for (index, city) in WEST_JAVA_CITIES.iter().enumerate() {
            assert!(
                WEST_JAVA_CITIES
                    .iter()
                    .skip(index + 1)
                    .all(|other| other.name != city.name),
                "{} listed twice",
                city.name
            );
        }
    }
}
