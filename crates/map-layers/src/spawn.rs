//! Spawning areas and distribution maps from the Institute of Marine
//! Research.

use std::path::Path;

use tracing::{info, instrument};
use wfs::{ResourceCache, WfsError};

use crate::error::{LayerError, LayerResult};
use crate::geojson::FeatureCollection;

/// Server publishing the distribution maps.
pub const SPAWN_SERVER: &str = "imr_fisk";

/// `wms_code` of spawning areas proper.
pub const DEFAULT_WMS_CODES: [i64; 1] = [10];

/// Norwegian common names and the layer holding each species' map.
pub static SPECIES: &[(&str, &str)] = &[
    ("blåkveite", "utbredelseskart:Blaakveite"),
    ("blålange", "utbredelseskart:Blaalange"),
    ("blåstål_rødnebb", "utbredelseskart:Blaastaal_Rodnebb"),
    ("breiflabb", "utbredelseskart:Breiflabb"),
    ("brisling", "utbredelseskart:Brisling"),
    ("brosme", "utbredelseskart:Brosme"),
    ("brugde", "utbredelseskart:Brugde"),
    ("dypvannsreke", "utbredelseskart:Dypvannsreke"),
    ("finnhval", "utbredelseskart:Finnhval"),
    ("fjesing", "utbredelseskart:Fjesing"),
    ("gråhai", "utbredelseskart:Graahai"),
    ("gressgylt", "utbredelseskart:Gressgylt"),
    ("grindhval", "utbredelseskart:Grindhval"),
    ("grønngylt_berggylt", "utbredelseskart:Groenngylt_Berggylt"),
    ("grønlandsel", "utbredelseskart:Gronlandsel"),
    ("kysttorsk", "utbredelseskart:kysttorsk"),
    ("håbrann", "utbredelseskart:Haabrann"),
    ("håkjerring", "utbredelseskart:Haakjerring"),
    ("haneskjell", "utbredelseskart:Haneskjell"),
    ("havert", "utbredelseskart:Havert"),
    ("havmus", "utbredelseskart:Havmus"),
    ("hummer", "utbredelseskart:Hummer"),
    ("hvalross", "utbredelseskart:Hvalross"),
    ("hvithval", "utbredelseskart:Hvithval"),
    ("hvitting", "utbredelseskart:Hvitting"),
    ("hyse_nea", "utbredelseskart:Hyse_Nordostarktisk"),
    ("isgalt", "utbredelseskart:Isgalt"),
    ("kamskjell", "utbredelseskart:Kamskjell"),
    ("klappmyss", "utbredelseskart:Klappmyss"),
    ("knølhval", "utbredelseskart:Knolhval"),
    ("kolmule", "utbredelseskart:Kolmule"),
    ("kongekrabbe", "utbredelseskart:Kongekrabbe"),
    ("kveite", "utbredelseskart:Kveite"),
    ("laks", "utbredelseskart:Laks"),
    ("lange", "utbredelseskart:Lange"),
    ("lodde_barentshavet", "utbredelseskart:Lodde_Barentshavet"),
    ("lodde_island", "utbredelseskart:Lodde_island"),
    ("lyr", "utbredelseskart:Lyr"),
    ("lysing", "utbredelseskart:Lysing"),
    ("makrell", "utbredelseskart:Makrell"),
    ("makrellstørje", "utbredelseskart:Makrellstorje"),
    ("mora", "utbredelseskart:Mora"),
    ("nvg_sild", "utbredelseskart:NVG_Sild"),
    ("narhval", "utbredelseskart:Narhval"),
    ("nebbhval", "utbredelseskart:Nebbhval"),
    ("nise", "utbredelseskart:Nise"),
    ("nordsjøhyse", "utbredelseskart:Nordsjohyse"),
    ("nordsjøsei", "utbredelseskart:Nordsjosei"),
    ("nordsjøsild", "utbredelseskart:Nordsjosild"),
    ("nordsjøtorsk", "utbredelseskart:Nordsjotorsk"),
    ("øyepål", "utbredelseskart:Oyepaal"),
    ("pigghå", "utbredelseskart:Pigghaa"),
    ("polartorsk", "utbredelseskart:Polartorsk"),
    ("raudåte", "utbredelseskart:Raudate"),
    ("ringsel", "utbredelseskart:Ringsel"),
    ("rødspette", "utbredelseskart:Roedspette"),
    ("sei_nea", "utbredelseskart:Sei_Nordostarktisk"),
    ("sjøkreps", "utbredelseskart:Sjokreps"),
    ("skjellbrosme", "utbredelseskart:Skjellbrosme"),
    ("skolest", "utbredelseskart:Skolest"),
    ("snabeluer", "utbredelseskart:Snabeluer"),
    ("snøkrabbe", "utbredelseskart:Snokrabbe"),
    ("spekkhogger", "utbredelseskart:Spekkhogger"),
    ("spermhval", "utbredelseskart:Spermhval"),
    ("springere_kvitnos", "utbredelseskart:Springere_Kvitnos"),
    ("springere_kvitskjeving", "utbredelseskart:Springere_Kvitskjeving"),
    ("steinkobbe", "utbredelseskart:Steinkobbe"),
    ("storkobbe", "utbredelseskart:Storkobbe"),
    ("stortare", "utbredelseskart:Stortare"),
    ("svarthå", "utbredelseskart:Svarthaa"),
    ("taggmakrell", "utbredelseskart:Taggmakrell"),
    ("taskekrabbe", "utbredelseskart:Taskekrabbe"),
    ("tobis", "utbredelseskart:Tobis"),
    ("vågehval", "utbredelseskart:Vaagehval"),
    ("vanliguer", "utbredelseskart:Vanliguer"),
    ("ål", "utbredelseskart:aal"),
    ("bergnebb", "utbredelseskart:bergnebb"),
    ("hågjel", "utbredelseskart:haagjel"),
    ("nordsjotorsk_2021", "utbredelseskart:nordsjotorsk_2021"),
    ("rognkjeks_rognkall", "utbredelseskart:rognkjeks_rognkall"),
    ("torsk_nea", "utbredelseskart:torsk_nea"),
];

/// Layer of a species. Names are matched without regard to case; a name
/// not in [`SPECIES`] is taken to be a layer name and returned unchanged.
pub fn layer_for_species(species: &str) -> String {
    let key = species.to_lowercase();
    SPECIES
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, layer)| layer.to_string())
        .unwrap_or_else(|| species.to_string())
}

/// Keep only features whose `wms_code` is one of `wms_codes`.
pub fn filter_wms_codes(collection: &FeatureCollection, wms_codes: &[i64]) -> FeatureCollection {
    let features = collection
        .features
        .iter()
        .filter(|feature| {
            feature
                .integer_property("wms_code")
                .is_some_and(|code| wms_codes.contains(&code))
        })
        .cloned()
        .collect();
    FeatureCollection {
        features,
        ..collection.clone()
    }
}

/// Areas of `layer` with one of the given `wms_codes`, optionally written
/// to `outfile` as GeoJSON.
#[instrument(skip(cache))]
pub async fn area(
    cache: &ResourceCache,
    layer: &str,
    wms_codes: &[i64],
    outfile: Option<&Path>,
) -> LayerResult<FeatureCollection> {
    let path = match cache.resource(layer, SPAWN_SERVER, false, None).await {
        Ok(path) => path,
        Err(WfsError::DownloadFailed { .. }) => {
            return Err(LayerError::UnknownSpecies(layer.to_string()))
        }
        Err(e) => return Err(e.into()),
    };

    let all = FeatureCollection::read(&path).await?;
    let selected = filter_wms_codes(&all, wms_codes);
    info!(
        total = all.features.len(),
        selected = selected.features.len(),
        "Filtered spawning areas"
    );

    if let Some(outfile) = outfile {
        selected.write(outfile).await?;
        info!(outfile = %outfile.display(), "Wrote spawning areas");
    }
    Ok(selected)
}
