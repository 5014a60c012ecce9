// src/consts.rs
//! Shared constants: key names, catalog prefixes and tuning defaults

/// Raw SQLCipher key length in bytes
pub const KEY_LENGTH: usize = 32;

/// Random suffix length for logical database directories
pub const FILE_ID_LENGTH: usize = 16;

/// Random suffix length for catalog directories
pub const CATALOG_ID_LENGTH: usize = 16;

/// Default service name under which secrets are filed in the OS vault
pub const DEFAULT_SECRET_SERVICE: &str = "fxstorage";

/// Secret name holding the catalog's own key
pub const CATALOG_KEY_NAME: &str = "metakey:fxstorage";

/// Catalog namespaces. Database keys in the secret store reuse the
/// descriptor prefix: `fxstorage_db:<name>`.
pub const PREFIX_DB: &str = "fxstorage_db:";
pub const PREFIX_EVENT: &str = "fxstorage_event:";
pub const CONFIG_KEY: &str = "fxstorage_config";

/// Catalog directories are `meta-<suffix>`; the newest one is canonical
pub const CATALOG_DIR_PREFIX: &str = "meta-";

/// Fixed name of the bootstrap lock store inside the store root
pub const LOCK_DB: &str = "lock.db";

/// Engine file inside every database directory
pub const ENGINE_FILE: &str = "store.db";

/// Parallel export workers used when streaming a database
pub const DEFAULT_EXPORT_WORKERS: usize = 20;

/// Entries committed per transaction when a write batch flushes
pub const BATCH_FLUSH_CHUNK: usize = 4096;

/// Pairs per message sent from an export worker to the collector
pub const STREAM_BATCH: usize = 1024;

/// SQLCipher page size shared by every store
pub const CIPHER_PAGE_SIZE: u32 = 4096;

/// Identity keypair files
pub const PRIVATE_KEY_FILE: &str = "key.pem";
pub const PUBLIC_KEY_FILE: &str = "public.pem";

/// Symbols used to pad a derived secret that is shorter than requested
pub const PADDING_CHARS: &[u8] = b"#$%&^*0@!";
