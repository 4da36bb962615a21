//! City/country to coordinates via the upstream geocoding endpoint.

use super::models::GeocodeResponse;
use super::{Geocoded, GeocodeQuery, MapsClient, MapsError, GEOCODE_URL};

/// Resolves a city/country pair to its central location. Takes the first
/// match; the canonical city name from the response is returned so the
/// caller can re-key cache entries when the upstream corrects the spelling.
pub(super) async fn geocode(
    client: &MapsClient,
    query: &GeocodeQuery,
) -> Result<Geocoded, MapsError> {
    let components = format!("locality:{}|country:{}", query.city, query.country);
    let response: GeocodeResponse = client
        .http()
        .get(GEOCODE_URL)
        .query(&[("components", components.as_str()), ("key", client.api_key())])
        .send()
        .await?
        .json()
        .await?;

    if response.status != "OK" {
        return Err(MapsError::Api {
            status: response.status,
            message: format!("geocoding failed for {}, {}", query.city, query.country),
        });
    }

    let first = response.results.first().ok_or(MapsError::NoGeocodeResult)?;
    let canonical_city = first
        .address_components
        .first()
        .map(|c| c.long_name.to_lowercase())
        .unwrap_or_else(|| query.city.clone());

    Ok(Geocoded {
        lat: first.geometry.location.lat,
        lng: first.geometry.location.lng,
        city: canonical_city,
    })
}
