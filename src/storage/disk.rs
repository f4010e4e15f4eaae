//! Append-only header file keyed by height.
//!
//! All headers from height 0 live contiguously in a single file, 80 bytes
//! per record with no framing; height is purely positional. A reader/writer
//! lock lets UI-style readers run concurrently with the single sync worker:
//! a read observes either the pre-write or post-write state of the record
//! it targets, never a mix.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::chain::{Header, HEADER_SIZE};
use crate::error::{StorageError, StorageResult};
use crate::storage::HEADERS_FILE_NAME;

const RECORD_SIZE: u64 = HEADER_SIZE as u64;

/// Append-only, randomly addressable on-disk sequence of headers.
pub struct HeaderStore {
    path: PathBuf,
    chunk_size: u32,
    inner: RwLock<Inner>,
}

struct Inner {
    file: File,
    len: u64,
}

impl HeaderStore {
    /// Open the header file inside `data_dir`, creating it if absent.
    ///
    /// When the file does not exist yet and `seed` names a readable file,
    /// it is copied in as a pre-synced starting point. Seeding is best
    /// effort: any failure falls back to an empty store.
    pub fn open(
        data_dir: impl AsRef<Path>,
        chunk_size: u32,
        seed: Option<&Path>,
    ) -> StorageResult<Self> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir)?;
        let path = data_dir.join(HEADERS_FILE_NAME);

        if !path.exists() {
            if let Some(seed) = seed {
                match fs::copy(seed, &path) {
                    Ok(bytes) => {
                        tracing::info!("seeded header store with {} bytes from {}", bytes, seed.display())
                    }
                    Err(e) => {
                        tracing::warn!("header seed {} unusable ({}), starting empty", seed.display(), e)
                    }
                }
            }
        }

        let file = OpenOptions::new().read(true).write(true).create(true).open(&path)?;
        let len = file.metadata()?.len();

        Ok(Self {
            path,
            chunk_size,
            inner: RwLock::new(Inner {
                file,
                len,
            }),
        })
    }

    /// Height of the last stored header, or `None` for an empty store.
    pub fn tip_height(&self) -> Option<u32> {
        let inner = self.inner.read().expect("store lock poisoned");
        records_to_tip(inner.len)
    }

    /// Read the header at `height`. Out-of-range heights return `None`,
    /// never an error.
    pub fn read(&self, height: u32) -> StorageResult<Option<Header>> {
        let inner = self.inner.read().expect("store lock poisoned");
        let offset = height as u64 * RECORD_SIZE;
        if offset + RECORD_SIZE > inner.len {
            return Ok(None);
        }

        // Readers use their own handle so concurrent reads do not contend
        // on a shared cursor.
        let mut file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        file.seek(SeekFrom::Start(offset))?;
        let mut record = [0u8; HEADER_SIZE];
        match file.read_exact(&mut record) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        // A record that round-trips the fixed size cannot fail decoding.
        Ok(Header::from_bytes(&record).ok())
    }

    /// Write one header record at `height * 80`.
    pub fn write(&self, header: &Header, height: u32) -> StorageResult<()> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        let offset = height as u64 * RECORD_SIZE;
        inner.file.seek(SeekFrom::Start(offset))?;
        inner.file.write_all(&header.to_bytes())?;
        inner.file.flush()?;
        inner.len = inner.len.max(offset + RECORD_SIZE);
        Ok(())
    }

    /// Write a verified chunk of raw records at `index * chunk_size * 80`.
    /// `raw` must be a multiple of the record size; an empty slice is a
    /// no-op.
    pub fn write_chunk(&self, index: u32, raw: &[u8]) -> StorageResult<()> {
        if raw.len() % HEADER_SIZE != 0 {
            return Err(StorageError::MisalignedChunk {
                len: raw.len(),
            });
        }
        if raw.is_empty() {
            return Ok(());
        }
        let mut inner = self.inner.write().expect("store lock poisoned");
        let offset = index as u64 * self.chunk_bytes();
        inner.file.seek(SeekFrom::Start(offset))?;
        inner.file.write_all(raw)?;
        inner.file.flush()?;
        inner.len = inner.len.max(offset + raw.len() as u64);
        Ok(())
    }

    /// Truncate to the largest multiple of a whole chunk not exceeding the
    /// current size. Returns the tip height after truncation.
    pub fn rollback_to_last_chunk_boundary(&self) -> StorageResult<Option<u32>> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        let boundary = (inner.len / self.chunk_bytes()) * self.chunk_bytes();
        inner.file.set_len(boundary)?;
        inner.len = boundary;
        tracing::debug!("rolled back header store to {} bytes", boundary);
        Ok(records_to_tip(boundary))
    }

    /// Size of the backing file in bytes.
    pub fn len_bytes(&self) -> u64 {
        self.inner.read().expect("store lock poisoned").len
    }

    fn chunk_bytes(&self) -> u64 {
        self.chunk_size as u64 * RECORD_SIZE
    }
}

fn records_to_tip(len: u64) -> Option<u32> {
    let records = len / RECORD_SIZE;
    if records == 0 {
        None
    } else {
        Some((records - 1) as u32)
    }
}
