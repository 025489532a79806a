use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};

use super::{FrameExporter, FrameRecord};
use crate::config::{ExportConfig, FieldFormat};
use crate::error::{SimError, SimErrorContext, SimResult};
use crate::grid::FieldArray;
use crate::simulation::SupervisedParamHistory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Velocity,
    Density,
}

impl FieldKind {
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Velocity => "velocity",
            FieldKind::Density => "density",
        }
    }
}

/// Self-describing field file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredField {
    pub kind: FieldKind,
    pub scene: usize,
    pub frame: usize,
    pub shape: [usize; 4],
    pub params: SupervisedParamHistory,
    /// CRC32 of the little-endian field data
    pub checksum: u32,
    pub data: Vec<f32>,
}

impl StoredField {
    fn new(kind: FieldKind, record: &FrameRecord<'_>, array: &FieldArray) -> Self {
        Self {
            kind,
            scene: record.scene,
            frame: record.frame,
            shape: array.shape(),
            params: record.params.clone(),
            checksum: checksum(array.data()),
            data: array.data().to_vec(),
        }
    }

    pub fn into_array(self) -> SimResult<FieldArray> {
        FieldArray::from_vec(self.shape, self.data)
    }
}

fn checksum(data: &[f32]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(bytemuck::cast_slice(data));
    hasher.finalize()
}

/// Writes each frame's fields as files below the run directory
#[derive(Debug, Clone)]
pub struct FieldStore {
    root: PathBuf,
    config: ExportConfig,
}

impl FieldStore {
    pub fn new(root: impl Into<PathBuf>, config: ExportConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Per-scene directory
    pub fn scene_dir(&self, scene: usize) -> PathBuf {
        self.root.join(format!("{:06}", scene))
    }

    /// File of one field of one frame
    pub fn path_for(&self, scene: usize, frame: usize, kind: FieldKind) -> PathBuf {
        let stem = self
            .config
            .field_path_format
            .replace("{kind}", kind.name())
            .replace("{frame}", &format!("{:06}", frame));
        let mut name = format!("{}.{}", stem, self.config.format.extension());
        if self.config.compress {
            name.push_str(".gz");
        }
        self.scene_dir(scene).join(name)
    }

    fn write_field(&self, kind: FieldKind, record: &FrameRecord<'_>, array: &FieldArray) -> SimResult<()> {
        let bytes = match self.config.format {
            FieldFormat::Bincode => bincode::serialize(&StoredField::new(kind, record, array))?,
            FieldFormat::Json => serde_json::to_vec(&StoredField::new(kind, record, array))?,
            FieldFormat::Raw => bytemuck::cast_slice::<f32, u8>(array.data()).to_vec(),
        };
        let bytes = if self.config.compress { compress(&bytes)? } else { bytes };

        let path = self.path_for(record.scene, record.frame, kind);
        let mut file = File::create(&path).sim_context(&format!("creating {}", path.display()))?;
        file.write_all(&bytes)
            .sim_context(&format!("writing {}", path.display()))?;
        Ok(())
    }

    fn read_bytes(&self, path: &Path) -> SimResult<Vec<u8>> {
        let bytes = fs::read(path).sim_context(&format!("reading {}", path.display()))?;
        if self.config.compress {
            decompress(&bytes)
        } else {
            Ok(bytes)
        }
    }

    /// Load a bincode or JSON field file, verifying its checksum
    pub fn load(&self, path: &Path) -> SimResult<StoredField> {
        let bytes = self.read_bytes(path)?;
        let field: StoredField = match self.config.format {
            FieldFormat::Bincode => bincode::deserialize(&bytes)?,
            FieldFormat::Json => serde_json::from_slice(&bytes)?,
            FieldFormat::Raw => {
                return Err(SimError::Serialization(format!(
                    "{} is a raw field without a header, use load_raw",
                    path.display()
                )))
            }
        };
        let found = checksum(&field.data);
        if found != field.checksum {
            return Err(SimError::ChecksumMismatch {
                path: path.to_path_buf(),
                expected: field.checksum,
                found,
            });
        }
        Ok(field)
    }

    /// Load a raw field file into an array of the given shape
    pub fn load_raw(&self, path: &Path, shape: [usize; 4]) -> SimResult<FieldArray> {
        let bytes = self.read_bytes(path)?;
        let data = bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        FieldArray::from_vec(shape, data)
    }
}

impl FrameExporter for FieldStore {
    fn write_frame(&mut self, record: &FrameRecord<'_>) -> SimResult<()> {
        let dir = self.scene_dir(record.scene);
        fs::create_dir_all(&dir).sim_context(&format!("creating {}", dir.display()))?;
        self.write_field(FieldKind::Velocity, record, record.velocity)?;
        self.write_field(FieldKind::Density, record, record.density)?;
        log::trace!("[FieldStore] Scene {} frame {} written", record.scene, record.frame);
        Ok(())
    }
}

fn compress(data: &[u8]) -> SimResult<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| SimError::Serialization(format!("Gzip compression failed: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| SimError::Serialization(format!("Gzip finalization failed: {}", e)))
}

fn decompress(data: &[u8]) -> SimResult<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| SimError::Serialization(format!("Gzip decompression failed: {}", e)))?;
    Ok(decompressed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridDims;
    use crate::obstacle::ControlParams;

    fn record<'a>(
        velocity: &'a FieldArray,
        density: &'a FieldArray,
        params: &'a SupervisedParamHistory,
    ) -> FrameRecord<'a> {
        FrameRecord { scene: 2, frame: 7, velocity, density, params }
    }

    fn sample() -> (FieldArray, FieldArray, SupervisedParamHistory) {
        let dims = GridDims::new(4, 3, 1);
        let mut velocity = FieldArray::zeros(dims, 3);
        velocity.data_mut()[5] = 1.5;
        let mut density = FieldArray::zeros(dims, 1);
        density.data_mut()[2] = 0.75;
        let mut params = SupervisedParamHistory::new();
        params.push(ControlParams { rotation: 0.1, position: 0.3 });
        (velocity, density, params)
    }

    #[test]
    fn test_path_layout() {
        let store = FieldStore::new("/tmp/run", ExportConfig { compress: true, ..Default::default() });
        assert_eq!(
            store.path_for(3, 12, FieldKind::Density),
            PathBuf::from("/tmp/run/000003/density_000012.bin.gz")
        );
    }

    #[test]
    fn test_bincode_gzip_file_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FieldStore::new(dir.path(), ExportConfig { compress: true, ..Default::default() });
        let (velocity, density, params) = sample();
        store.write_frame(&record(&velocity, &density, &params)).unwrap();

        let loaded = store.load(&store.path_for(2, 7, FieldKind::Velocity)).unwrap();
        assert_eq!(loaded.kind, FieldKind::Velocity);
        assert_eq!(loaded.frame, 7);
        assert_eq!(loaded.params, params);
        assert_eq!(loaded.into_array().unwrap(), velocity);
    }

    #[test]
    fn test_json_checksum_detects_tampering() {
        let dir = tempfile::tempdir().unwrap();
        let config = ExportConfig { format: FieldFormat::Json, ..Default::default() };
        let mut store = FieldStore::new(dir.path(), config);
        let (velocity, density, params) = sample();
        store.write_frame(&record(&velocity, &density, &params)).unwrap();

        let path = store.path_for(2, 7, FieldKind::Density);
        let mut field: StoredField = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        field.data[0] = 9.0;
        fs::write(&path, serde_json::to_vec(&field).unwrap()).unwrap();
        assert!(matches!(store.load(&path), Err(SimError::ChecksumMismatch { .. })));
    }

    #[test]
    fn test_raw_format() {
        let dir = tempfile::tempdir().unwrap();
        let config = ExportConfig { format: FieldFormat::Raw, ..Default::default() };
        let mut store = FieldStore::new(dir.path(), config);
        let (velocity, density, params) = sample();
        store.write_frame(&record(&velocity, &density, &params)).unwrap();
        let path = store.path_for(2, 7, FieldKind::Density);
        assert_eq!(fs::metadata(&path).unwrap().len(), 12 * 4);
        assert_eq!(store.load_raw(&path, density.shape()).unwrap(), density);
        assert!(store.load(&path).is_err());
    }
}
