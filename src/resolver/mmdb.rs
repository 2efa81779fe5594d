use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, RwLock};
use std::time::{Duration, SystemTime};

use maxminddb::{MaxMindDBError, Reader};
use nullnet_liberror::{location, Error, ErrorHandler, Location};
use serde::Deserialize;

use crate::country::CountryCode;
use crate::helpers::get_timestamp_string;
use crate::resolver::CountryLookup;

static GEO_DATABASE: OnceLock<Arc<GeoDatabase>> = OnceLock::new();

/// Initializes the process-wide geolocation database (empty until a file is loaded).
/// Calling it again returns the already initialized instance.
pub fn init_global_database() -> Arc<GeoDatabase> {
    GEO_DATABASE
        .get_or_init(|| Arc::new(GeoDatabase::new()))
        .clone()
}

pub fn global_database() -> Option<Arc<GeoDatabase>> {
    GEO_DATABASE.get().cloned()
}

#[derive(Default)]
pub enum MmdbReader {
    #[default]
    Empty,
    Reader(Reader<Vec<u8>>),
}

/// Immutable view of the geolocation data at one point in time.
#[derive(Default)]
pub struct MmdbSnapshot {
    reader: MmdbReader,
    generation: u64,
    source: Option<String>,
    loaded_at: Option<String>,
}

impl MmdbSnapshot {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn loaded_at(&self) -> Option<&str> {
        self.loaded_at.as_deref()
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.reader, MmdbReader::Reader(_))
    }

    pub fn lookup_country(&self, ip: IpAddr) -> Result<Option<CountryCode>, Error> {
        let MmdbReader::Reader(reader) = &self.reader else {
            return Err("Geolocation database not loaded").handle_err(location!());
        };
        match reader.lookup::<CountryRecord>(ip) {
            Ok(record) => Ok(record.iso_code().and_then(CountryCode::parse)),
            Err(MaxMindDBError::AddressNotFoundError(_)) => Ok(None),
            Err(err) => Err(err).handle_err(location!()),
        }
    }
}

#[derive(Deserialize, Debug)]
struct CountryRecord {
    country: Option<IsoCountry>,
    registered_country: Option<IsoCountry>,
}

#[derive(Deserialize, Debug)]
struct IsoCountry {
    iso_code: Option<String>,
}

impl CountryRecord {
    fn iso_code(&self) -> Option<&str> {
        self.country
            .as_ref()
            .and_then(|c| c.iso_code.as_deref())
            .or_else(|| {
                self.registered_country
                    .as_ref()
                    .and_then(|c| c.iso_code.as_deref())
            })
    }
}

/// Geolocation data shared by every check.
///
/// Lookups work on an `Arc` of the current snapshot; a reload builds a whole new snapshot
/// and swaps the pointer, bumping the generation. Live data is never modified in place.
pub struct GeoDatabase {
    current: RwLock<Arc<MmdbSnapshot>>,
    generation: AtomicU64,
}

impl GeoDatabase {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(MmdbSnapshot::default())),
            generation: AtomicU64::new(0),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> Arc<MmdbSnapshot> {
        match self.current.read() {
            Ok(current) => Arc::clone(&current),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Replaces the current snapshot and returns its generation.
    pub fn install(&self, reader: Reader<Vec<u8>>, source: &str) -> u64 {
        let mut current = match self.current.write() {
            Ok(current) => current,
            Err(poisoned) => poisoned.into_inner(),
        };
        let generation = self.generation.load(Ordering::Acquire) + 1;
        *current = Arc::new(MmdbSnapshot {
            reader: MmdbReader::Reader(reader),
            generation,
            source: Some(source.to_string()),
            loaded_at: Some(get_timestamp_string()),
        });
        // published while still holding the write lock, so a reader observing the new
        // generation can only get the new snapshot
        self.generation.store(generation, Ordering::Release);
        generation
    }

    pub fn reload_from_file(&self, path: &Path) -> Result<u64, Error> {
        log::info!("Loading geolocation database from '{}'...", path.display());
        let reader = load_reader(path)?;
        let generation = self.install(reader, &path.display().to_string());
        log::info!(
            "Geolocation database '{}' loaded (generation {generation})",
            path.display()
        );
        Ok(generation)
    }
}

impl Default for GeoDatabase {
    fn default() -> Self {
        Self::new()
    }
}

fn load_reader(path: &Path) -> Result<Reader<Vec<u8>>, Error> {
    let bytes = std::fs::read(path).handle_err(location!())?;
    Reader::from_source(bytes).handle_err(location!())
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Reloads the database every `interval` when the file at `path` has changed since
/// the last successful load.
pub fn spawn_periodic_reload(
    db: Arc<GeoDatabase>,
    path: PathBuf,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut last_modified = if db.snapshot().is_loaded() {
            modified_time(&path)
        } else {
            None
        };
        let mut ticker = tokio::time::interval(interval);
        // the first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let modified = modified_time(&path);
            if modified.is_none() || modified == last_modified {
                continue;
            }
            let db_2 = db.clone();
            let path_2 = path.clone();
            match tokio::task::spawn_blocking(move || db_2.reload_from_file(&path_2)).await {
                Ok(Ok(_)) => last_modified = modified,
                Ok(Err(err)) => log::error!("Geolocation database reload failed: {}", err.to_str()),
                Err(err) => log::error!("Geolocation database reload task failed: {err}"),
            }
        }
    })
}

/// Country lookups against the shared geolocation database.
#[derive(Clone)]
pub struct MmdbLookup {
    db: Arc<GeoDatabase>,
}

impl MmdbLookup {
    pub fn new(db: Arc<GeoDatabase>) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Arc<GeoDatabase> {
        &self.db
    }
}

impl CountryLookup for MmdbLookup {
    async fn lookup(&self, ip: IpAddr) -> Result<Option<CountryCode>, Error> {
        self.db.snapshot().lookup_country(ip)
    }

    fn generation(&self) -> u64 {
        self.db.generation()
    }
}
