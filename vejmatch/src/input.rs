use std::{fs, path::Path};

use geo_types::{Geometry, MultiLineString};
use log::{info, warn};
use rusty_match::{Attributes, Id, Network, NetworkError, Source};
use serde::Deserialize;
use wkt::TryFromWkt;

use crate::error::CliError;

#[derive(Debug, Deserialize)]
pub struct FeatureFile {
    pub crs: String,
    pub features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
pub struct Feature {
    pub id: Id,
    pub wkt: String,
    #[serde(default)]
    pub attributes: Attributes,
}

fn parse_lines(id: Id, text: &str) -> Result<MultiLineString<f64>, CliError> {
    let geometry = Geometry::<f64>::try_from_wkt_str(text).map_err(|e| CliError::Wkt {
        id,
        message: e.to_string(),
    })?;
    match geometry {
        Geometry::LineString(line) => Ok(MultiLineString::new(vec![line])),
        Geometry::MultiLineString(lines) => Ok(lines),
        _ => Err(CliError::NotALine { id }),
    }
}

/// Builds a network from parsed features.
///
/// Features whose parts cannot be merged stay in [`Network::rejected`],
/// every other problem stops the load.
pub fn network_from_features(file: FeatureFile, source: Source) -> Result<Network, CliError> {
    let mut network = Network::new(source, file.crs);
    for feature in file.features {
        let parts = parse_lines(feature.id, &feature.wkt)?;
        match network.insert_parts(feature.id, &parts, feature.attributes) {
            Ok(_) | Err(NetworkError::Geometry { .. }) => {}
            Err(e) => return Err(e.into()),
        }
    }
    if !network.rejected.is_empty() {
        warn!(
            "{} {source} features could not be merged into single lines",
            network.rejected.len()
        );
    }
    Ok(network)
}

pub fn load_network(path: &Path, source: Source) -> Result<Network, CliError> {
    let text = fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_owned(),
        source,
    })?;
    let file: FeatureFile = serde_json::from_str(&text)?;
    let network = network_from_features(file, source)?;
    info!(
        "loaded {} {source} edges from {}",
        network.len(),
        path.display()
    );
    Ok(network)
}
