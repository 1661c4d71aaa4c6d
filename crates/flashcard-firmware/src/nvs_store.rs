//! Card progress in ESP-IDF NVS.

use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};
use esp_idf_svc::sys::EspError;

use flashcard_core::{KeyValueStore, Namespace, RECORD_WIDTH};

/// Largest value read back; card records are `RECORD_WIDTH` bytes, so anything
/// past this is corrupt anyway and only needs to be reported with its length.
const READ_BUFFER_SIZE: usize = 64;

/// [`KeyValueStore`] over the default NVS partition.
///
/// Namespaces are opened lazily and kept open.
pub struct NvsStore {
    partition: EspDefaultNvsPartition,
    open: Option<(Namespace, EspNvs<NvsDefault>)>,
}

impl NvsStore {
    pub fn new(partition: EspDefaultNvsPartition) -> Self {
        Self {
            partition,
            open: None,
        }
    }

    fn handle(&mut self, namespace: &Namespace) -> Result<&mut EspNvs<NvsDefault>, EspError> {
        let nvs = match self.open.take() {
            Some((name, nvs)) if name == *namespace => nvs,
            _ => {
                let nvs = EspNvs::new(self.partition.clone(), namespace.as_str(), true)?;
                log::info!("NVS: opened namespace {}", namespace);
                nvs
            }
        };
        let (_, nvs) = self.open.insert((namespace.clone(), nvs));
        Ok(nvs)
    }
}

impl KeyValueStore for NvsStore {
    type Error = EspError;

    fn get(&mut self, namespace: &Namespace, key: &str) -> Result<Option<Vec<u8>>, EspError> {
        let nvs = self.handle(namespace)?;
        let Some(len) = nvs.blob_len(key)? else {
            return Ok(None);
        };
        if len > READ_BUFFER_SIZE {
            log::warn!("NVS: {} holds {} bytes, expected {}", key, len, RECORD_WIDTH);
            return Ok(Some(vec![0; len]));
        }
        let mut buf = [0u8; READ_BUFFER_SIZE];
        Ok(nvs.get_blob(key, &mut buf)?.map(<[u8]>::to_vec))
    }

    fn set(&mut self, namespace: &Namespace, key: &str, value: &[u8]) -> Result<(), EspError> {
        self.handle(namespace)?.set_blob(key, value)
    }

    fn remove(&mut self, namespace: &Namespace, key: &str) -> Result<bool, EspError> {
        self.handle(namespace)?.remove(key)
    }
}
