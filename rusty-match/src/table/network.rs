use std::collections::{HashMap, HashSet};

use derive_more::{Display, From, Into};
use geo_types::{LineString, MultiLineString};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::{merge_lines, GeometryError, Id, Meter, NetworkError};

use super::*;

/// Parts of a multi-line closer than this are joined when an edge is inserted.
pub const MERGE_TOLERANCE: Meter = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum Source {
    #[display("reference")]
    Reference,
    #[display("target")]
    Target,
}

/// Name of a planar coordinate reference system, e.g. `EPSG:25832`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, From, Into, Serialize, Deserialize)]
pub struct Crs(String);

impl From<&str> for Crs {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeKey(pub Id);

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub id: Id,
    pub geom: LineString<f64>,
    pub attributes: Attributes,
}

#[derive(Debug, Clone, Copy)]
pub struct EdgeView<'a> {
    pub id: Id,
    pub geom: &'a LineString<f64>,
    pub attributes: &'a Attributes,
}

/// An edge whose geometry could not be turned into a single line.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejected {
    pub id: Id,
    pub error: GeometryError,
}

/// Column oriented collection of edges from one source network.
#[derive(Debug, Clone)]
pub struct Network {
    pub source: Source,
    pub crs: Crs,
    pub id: Vec<Id>, // Primary key
    pub geom: Vec<LineString<f64>>,
    pub attributes: Vec<Attributes>,
    pub rejected: Vec<Rejected>,
    rows: HashMap<Id, usize>,
    rejected_ids: HashSet<Id>,
}

impl Network {
    pub fn new(source: Source, crs: impl Into<Crs>) -> Self {
        Self {
            source,
            crs: crs.into(),
            id: Vec::new(),
            geom: Vec::new(),
            attributes: Vec::new(),
            rejected: Vec::new(),
            rows: HashMap::new(),
            rejected_ids: HashSet::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = EdgeView<'_>> {
        self.id
            .iter()
            .zip(&self.geom)
            .zip(&self.attributes)
            .map(|((&id, geom), attributes)| EdgeView {
                id,
                geom,
                attributes,
            })
    }

    pub fn get(&self, key: &EdgeKey) -> Option<EdgeView<'_>> {
        let index = self.find_index(key)?;
        Some(EdgeView {
            id: self.id[index],
            geom: &self.geom[index],
            attributes: &self.attributes[index],
        })
    }

    pub fn attribute(&self, key: &EdgeKey, name: &str) -> Option<&Value> {
        self.get(key)?.attributes.get(name)
    }

    /// Sets `name` on the edge, returns `false` if the edge does not exist.
    pub fn set_attribute(&mut self, key: &EdgeKey, name: &str, value: Value) -> bool {
        let Some(index) = self.find_index(key) else {
            return false;
        };
        self.attributes[index].insert(name.to_owned(), value);
        true
    }

    /// Inserts an edge whose geometry may come in several parts.
    ///
    /// The parts are merged into one line first. An edge that cannot be
    /// merged is kept in [`Network::rejected`] so it can be reported later.
    pub fn insert_parts(
        &mut self,
        id: Id,
        parts: &MultiLineString<f64>,
        attributes: Attributes,
    ) -> Result<EdgeKey, NetworkError> {
        if self.rows.contains_key(&id) || self.rejected_ids.contains(&id) {
            return Err(NetworkError::DuplicateId(id));
        }

        match merge_lines(parts, MERGE_TOLERANCE) {
            Ok(geom) => self.insert(Edge {
                id,
                geom,
                attributes,
            }),
            Err(error) => {
                warn!("{} edge {id} rejected: {error}", self.source);
                self.rejected_ids.insert(id);
                self.rejected.push(Rejected {
                    id,
                    error: error.clone(),
                });
                Err(NetworkError::Geometry { id, source: error })
            }
        }
    }
}

impl Insertable<Edge> for Network {
    type Key = Result<EdgeKey, NetworkError>;

    fn insert(&mut self, data: Edge) -> Self::Key {
        if self.rows.contains_key(&data.id) {
            return Err(NetworkError::DuplicateId(data.id));
        }
        if data.geom.0.len() < 2 {
            return Err(NetworkError::Geometry {
                id: data.id,
                source: GeometryError::TooFewCoordinates(data.geom.0.len()),
            });
        }

        self.rows.insert(data.id, self.id.len());
        self.id.push(data.id);
        self.geom.push(data.geom);
        self.attributes.push(data.attributes);

        Ok(EdgeKey(data.id))
    }
}

impl Deleteable<EdgeKey> for Network {
    type Output = Edge;
    fn delete(&mut self, key: &EdgeKey) -> Option<Self::Output> {
        let index = self.rows.remove(&key.0)?;
        for row in self.rows.values_mut() {
            if *row > index {
                *row -= 1;
            }
        }
        Some(Self::Output {
            id: self.id.remove(index),
            geom: self.geom.remove(index),
            attributes: self.attributes.remove(index),
        })
    }
}

impl Queryable<EdgeKey> for Network {
    fn find_index(&self, key: &EdgeKey) -> Option<usize> {
        self.rows.get(&key.0).copied()
    }
}
