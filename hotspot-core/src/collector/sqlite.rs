//! SQLite-backed POI collector.
//!
//! Distance is computed inside the query itself: a deterministic
//! `haversine` scalar function is registered on the connection, so the
//! acceptance band (`distance < radius + accuracy`) is applied by the
//! database and only matching rows are materialised. All query parameters
//! are bound, never interpolated.

use std::fmt;
use std::path::Path;

use geo::Coord;
use log::warn;
use rusqlite::functions::FunctionFlags;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, Row, ToSql, Transaction, params};
use serde_json::Value;

use crate::geo::haversine_distance;
use crate::poi::Poi;
use crate::record::Record;

use super::{CollectorError, PoiCollector, PoiQuery, StoreMode};

impl From<rusqlite::Error> for CollectorError {
    fn from(source: rusqlite::Error) -> Self {
        Self::Storage {
            message: source.to_string(),
        }
    }
}

const SELECT_ALL: &str = "SELECT *, haversine(?1, ?2, lat, lon) AS distance FROM poi";

const SELECT_WITHIN: &str = "SELECT * FROM \
    (SELECT *, haversine(?1, ?2, lat, lon) AS distance FROM poi) \
    WHERE distance < ?3";

/// POI collector persisting to a SQLite database.
pub struct SqlitePoiCollector {
    connection: Connection,
}

impl fmt::Debug for SqlitePoiCollector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlitePoiCollector").finish_non_exhaustive()
    }
}

impl SqlitePoiCollector {
    /// Open (or create) a collector backed by the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CollectorError> {
        Self::initialise(Connection::open(path)?)
    }

    /// Open a collector backed by an in-memory database.
    pub fn open_in_memory() -> Result<Self, CollectorError> {
        Self::initialise(Connection::open_in_memory()?)
    }

    fn initialise(connection: Connection) -> Result<Self, CollectorError> {
        register_haversine(&connection)?;
        create_schema(&connection)?;
        Ok(Self { connection })
    }

    fn select_records(
        &self,
        sql: &str,
        parameters: &[&dyn ToSql],
    ) -> Result<Vec<Record>, CollectorError> {
        let mut statement = self.connection.prepare(sql)?;
        let columns: Vec<String> = statement
            .column_names()
            .iter()
            .map(ToString::to_string)
            .collect();
        let mut rows = statement.query(parameters)?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(row_to_record(&columns, row)?);
        }
        Ok(records)
    }

    /// Merge a POI row's sub-entities (actions, object, transform) into
    /// its record via keyed lookups, ahead of model construction.
    fn attach_sub_entities(&self, record: &mut Record) -> Result<(), CollectorError> {
        let Some(id) = record.get("id").and_then(Value::as_i64) else {
            return Ok(());
        };

        let actions =
            self.select_records("SELECT * FROM action WHERE poiID = ?1 ORDER BY id", &[&id])?;
        record.insert(
            "actions".to_owned(),
            Value::Array(actions.into_iter().map(Value::Object).collect()),
        );

        let mut objects = self.select_records("SELECT * FROM object WHERE poiID = ?1", &[&id])?;
        if let Some(object) = objects.pop() {
            record.insert("object".to_owned(), Value::Object(object));
        }

        let mut transforms =
            self.select_records("SELECT * FROM transform WHERE poiID = ?1", &[&id])?;
        if let Some(transform) = transforms.pop() {
            record.insert("transform".to_owned(), Value::Object(transform));
        }

        Ok(())
    }
}

impl PoiCollector for SqlitePoiCollector {
    fn get_pois(&self, query: &PoiQuery) -> Result<Vec<Poi>, CollectorError> {
        let lat = query.origin.y;
        let lon = query.origin.x;
        let mut records = if query.radius > 0 {
            let band = (query.radius + query.accuracy) as f64;
            self.select_records(SELECT_WITHIN, &[&lat, &lon, &band])?
        } else {
            self.select_records(SELECT_ALL, &[&lat, &lon])?
        };

        let mut pois = Vec::with_capacity(records.len());
        for record in &mut records {
            self.attach_sub_entities(record)?;
            pois.push(Poi::from_record(record)?);
        }
        Ok(pois)
    }

    fn store_pois(&mut self, pois: &mut [Poi], mode: StoreMode) -> Result<(), CollectorError> {
        let transaction = self.connection.transaction()?;
        match mode {
            StoreMode::Replace => {
                transaction.execute_batch(
                    "DELETE FROM action; \
                     DELETE FROM object; \
                     DELETE FROM transform; \
                     DELETE FROM poi;",
                )?;
                for poi in pois.iter_mut() {
                    insert_poi(&transaction, poi)?;
                }
            }
            StoreMode::Update => {
                for poi in pois.iter_mut() {
                    upsert_poi(&transaction, poi)?;
                }
            }
        }
        transaction.commit()?;
        Ok(())
    }
}

fn register_haversine(connection: &Connection) -> Result<(), CollectorError> {
    connection.create_scalar_function(
        "haversine",
        4,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |context| {
            let lat1: f64 = context.get(0)?;
            let lon1: f64 = context.get(1)?;
            let lat2: f64 = context.get(2)?;
            let lon2: f64 = context.get(3)?;
            Ok(haversine_distance(
                Coord { x: lon1, y: lat1 },
                Coord { x: lon2, y: lat2 },
            ))
        },
    )?;
    Ok(())
}

fn create_schema(connection: &Connection) -> Result<(), CollectorError> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS poi (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL DEFAULT '',
            line2 TEXT,
            line3 TEXT,
            line4 TEXT,
            lat REAL NOT NULL DEFAULT 0,
            lon REAL NOT NULL DEFAULT 0,
            imageURL TEXT,
            attribution TEXT,
            type INTEGER NOT NULL DEFAULT 0,
            dimension INTEGER NOT NULL DEFAULT 1,
            alt INTEGER NOT NULL DEFAULT 0,
            relativeAlt INTEGER NOT NULL DEFAULT 0,
            doNotIndex INTEGER NOT NULL DEFAULT 0,
            inFocus INTEGER NOT NULL DEFAULT 0,
            showSmallBiw INTEGER NOT NULL DEFAULT 1,
            showBiwOnClick INTEGER NOT NULL DEFAULT 1
        );
        CREATE TABLE IF NOT EXISTS action (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            poiID INTEGER NOT NULL,
            uri TEXT NOT NULL DEFAULT '',
            label TEXT NOT NULL DEFAULT '',
            contentType TEXT,
            method TEXT NOT NULL DEFAULT 'GET',
            activityType INTEGER,
            params TEXT NOT NULL DEFAULT '',
            closeBiw INTEGER NOT NULL DEFAULT 0,
            showActivity INTEGER NOT NULL DEFAULT 1,
            activityMessage TEXT,
            autoTriggerRange INTEGER,
            autoTriggerOnly INTEGER NOT NULL DEFAULT 0
        );
        CREATE TABLE IF NOT EXISTS object (
            poiID INTEGER PRIMARY KEY,
            baseURL TEXT NOT NULL DEFAULT '',
            full TEXT NOT NULL DEFAULT '',
            reduced TEXT,
            icon TEXT,
            size REAL NOT NULL DEFAULT 0
        );
        CREATE TABLE IF NOT EXISTS transform (
            poiID INTEGER PRIMARY KEY,
            rel INTEGER NOT NULL DEFAULT 0,
            angle REAL NOT NULL DEFAULT 0,
            scale REAL NOT NULL DEFAULT 1
        );",
    )?;
    Ok(())
}

/// Convert one row into a loosely-typed record keyed by column name.
/// Text is decoded from the driver's bytes exactly once, here.
fn row_to_record(columns: &[String], row: &Row<'_>) -> Result<Record, CollectorError> {
    let mut record = Record::new();
    for (index, name) in columns.iter().enumerate() {
        let value = match row.get_ref(index)? {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(v) => Value::from(v),
            ValueRef::Real(v) => Value::from(v),
            ValueRef::Text(bytes) => Value::from(String::from_utf8_lossy(bytes).into_owned()),
            ValueRef::Blob(_) => {
                warn!("ignoring blob column {name} in POI row");
                Value::Null
            }
        };
        record.insert(name.clone(), value);
    }
    Ok(record)
}

/// The rowid a POI claims, when it claims one. Ids live in an INTEGER
/// PRIMARY KEY column, so a non-numeric id cannot match an existing row
/// and the POI is treated as new.
fn claimed_rowid(poi: &Poi) -> Option<i64> {
    poi.id.as_deref().and_then(|id| id.trim().parse().ok())
}

fn upsert_poi(transaction: &Transaction<'_>, poi: &mut Poi) -> Result<(), CollectorError> {
    let known = match claimed_rowid(poi) {
        Some(id) => {
            let mut statement = transaction.prepare("SELECT 1 FROM poi WHERE id = ?1")?;
            statement.exists(params![id])?
        }
        None => false,
    };
    if known {
        update_poi(transaction, poi)
    } else {
        insert_poi(transaction, poi)
    }
}

fn insert_poi(transaction: &Transaction<'_>, poi: &mut Poi) -> Result<(), CollectorError> {
    let volume = poi.detail.volume();
    transaction.execute(
        "INSERT INTO poi (id, title, line2, line3, line4, lat, lon, imageURL, attribution, \
         type, dimension, alt, relativeAlt, doNotIndex, inFocus, showSmallBiw, showBiwOnClick) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        params![
            claimed_rowid(poi),
            poi.title,
            poi.line2,
            poi.line3,
            poi.line4,
            poi.lat,
            poi.lon,
            poi.image_url,
            poi.attribution,
            poi.poi_type,
            poi.detail.dimension(),
            volume.map_or(0, |v| v.alt),
            volume.map_or(0, |v| v.relative_alt),
            poi.do_not_index,
            poi.in_focus,
            poi.show_small_biw,
            poi.show_biw_on_click,
        ],
    )?;
    let id = transaction.last_insert_rowid();
    poi.id = Some(id.to_string());
    save_sub_entities(transaction, id, poi)
}

fn update_poi(transaction: &Transaction<'_>, poi: &mut Poi) -> Result<(), CollectorError> {
    let Some(id) = claimed_rowid(poi) else {
        return insert_poi(transaction, poi);
    };
    let volume = poi.detail.volume();
    transaction.execute(
        "UPDATE poi SET title = ?2, line2 = ?3, line3 = ?4, line4 = ?5, lat = ?6, lon = ?7, \
         imageURL = ?8, attribution = ?9, type = ?10, dimension = ?11, alt = ?12, \
         relativeAlt = ?13, doNotIndex = ?14, inFocus = ?15, showSmallBiw = ?16, \
         showBiwOnClick = ?17 WHERE id = ?1",
        params![
            id,
            poi.title,
            poi.line2,
            poi.line3,
            poi.line4,
            poi.lat,
            poi.lon,
            poi.image_url,
            poi.attribution,
            poi.poi_type,
            poi.detail.dimension(),
            volume.map_or(0, |v| v.alt),
            volume.map_or(0, |v| v.relative_alt),
            poi.do_not_index,
            poi.in_focus,
            poi.show_small_biw,
            poi.show_biw_on_click,
        ],
    )?;
    save_sub_entities(transaction, id, poi)
}

/// Sub-entities are fully replaced on every save. Object and transform
/// rows are only persisted for multidimensional POIs.
fn save_sub_entities(
    transaction: &Transaction<'_>,
    id: i64,
    poi: &Poi,
) -> Result<(), CollectorError> {
    transaction.execute("DELETE FROM action WHERE poiID = ?1", params![id])?;
    transaction.execute("DELETE FROM object WHERE poiID = ?1", params![id])?;
    transaction.execute("DELETE FROM transform WHERE poiID = ?1", params![id])?;

    for action in &poi.actions {
        transaction.execute(
            "INSERT INTO action (poiID, uri, label, contentType, method, activityType, \
             params, closeBiw, showActivity, activityMessage, autoTriggerRange, autoTriggerOnly) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                id,
                action.uri,
                action.label,
                action.content_type,
                action.method,
                action.activity_type,
                action.params.join(","),
                action.close_biw,
                action.show_activity,
                action.activity_message,
                action.auto_trigger_range,
                action.auto_trigger_only,
            ],
        )?;
    }

    if let Some(volume) = poi.detail.volume() {
        transaction.execute(
            "INSERT INTO object (poiID, baseURL, full, reduced, icon, size) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id,
                volume.object.base_url,
                volume.object.full,
                volume.object.reduced,
                volume.object.icon,
                volume.object.size,
            ],
        )?;
        transaction.execute(
            "INSERT INTO transform (poiID, rel, angle, scale) VALUES (?1, ?2, ?3, ?4)",
            params![
                id,
                volume.transform.rel,
                volume.transform.angle,
                volume.transform.scale,
            ],
        )?;
    }

    Ok(())
}
