use std::collections::HashMap;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use bio::io::fasta;

use crate::error::require_file;
use crate::error::PipelineError;

/// One FASTA record. The description is kept so that written records retain their full header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRecord {
    pub id: String,
    pub desc: Option<String>,
    pub residues: Vec<u8>,
}
impl SequenceRecord {
    pub fn new(id: &str, residues: &[u8]) -> SequenceRecord {
        SequenceRecord {
            id: id.to_string(),
            desc: None,
            residues: residues.to_vec(),
        }
    }
}
impl From<fasta::Record> for SequenceRecord {
    fn from(rec: fasta::Record) -> Self {
        SequenceRecord {
            id: rec.id().to_string(),
            desc: rec.desc().map(String::from),
            residues: rec.seq().to_vec(),
        }
    }
}

/// Open a file that may or may not be compressed. Compression is detected from the magic bytes
pub fn open_maybe_compressed(p: &Path) -> anyhow::Result<Box<dyn Read>> {
    let opened_handle =
        File::open(p).with_context(|| format!("Could not open file {}", p.display()))?;

    match niffler::get_reader(Box::new(opened_handle)) {
        Ok((reader, compression)) => {
            log::debug!(
                "Opened file {} with compression {:?}",
                p.display(),
                &compression
            );
            Ok(reader)
        }
        // Too short to sniff; such a file cannot be compressed
        Err(niffler::Error::FileTooShort) => Ok(Box::new(File::open(p)?)),
        Err(e) => Err(e).with_context(|| format!("Could not open file {}", p.display())),
    }
}

pub fn open_fasta(p: &Path) -> anyhow::Result<fasta::Reader<BufReader<Box<dyn Read>>>> {
    Ok(fasta::Reader::new(open_maybe_compressed(p)?))
}

/// Read all records of a FASTA file, in file order
pub fn read_fasta_records(p: &Path) -> anyhow::Result<Vec<SequenceRecord>> {
    let reader = open_fasta(p)?;
    let mut list = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| PipelineError::FileNotValid {
            path: p.to_path_buf(),
            msg: Some(e.to_string()),
        })?;
        list.push(SequenceRecord::from(record));
    }
    Ok(list)
}

/// Count the records of a FASTA file
pub fn count_fasta_records(p: &Path) -> anyhow::Result<usize> {
    let reader = open_fasta(p)?;
    let mut n = 0;
    for record in reader.records() {
        record.map_err(|e| PipelineError::FileNotValid {
            path: p.to_path_buf(),
            msg: Some(e.to_string()),
        })?;
        n += 1;
    }
    Ok(n)
}

/// Collect the ids of all records, i.e. the header up to the first whitespace
pub fn read_fasta_ids(p: &Path) -> anyhow::Result<HashSet<String>> {
    Ok(read_fasta_records(p)?
        .into_iter()
        .map(|rec| rec.id)
        .collect())
}

/// Write records to a FASTA file. The content is first written to a hidden file next to the
/// destination and then renamed, so readers only ever see a complete file
pub fn write_fasta_atomic<'a, I>(p: &Path, records: I) -> anyhow::Result<()>
where
    I: IntoIterator<Item = &'a SequenceRecord>,
{
    let path_tmp = tmp_path_for(p);
    let result = write_fasta(&path_tmp, records).and_then(|_| {
        std::fs::rename(&path_tmp, p)
            .with_context(|| format!("Could not move {} into place", p.display()))
    });
    if result.is_err() {
        let _ = std::fs::remove_file(&path_tmp);
    }
    result
}

fn write_fasta<'a, I>(p: &Path, records: I) -> anyhow::Result<()>
where
    I: IntoIterator<Item = &'a SequenceRecord>,
{
    let file = File::create(p).with_context(|| format!("Could not create {}", p.display()))?;
    let mut writer = fasta::Writer::new(file);
    for rec in records {
        writer.write(&rec.id, rec.desc.as_deref(), &rec.residues)?;
    }
    writer.flush()?;
    Ok(())
}

fn tmp_path_for(p: &Path) -> PathBuf {
    let name = p
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    p.with_file_name(format!(".{}.tmp", name))
}

///////////////////////////////
/// All sequences that can be placed in clusters, keyed by id
pub struct SequenceUniverse {
    records: HashMap<String, SequenceRecord>,
}
impl SequenceUniverse {
    pub fn from_records(list: Vec<SequenceRecord>) -> SequenceUniverse {
        let mut records = HashMap::with_capacity(list.len());
        for rec in list {
            if records.contains_key(&rec.id) {
                log::warn!("Sequence '{}' occurs more than once, keeping the first", rec.id);
                continue;
            }
            records.insert(rec.id.clone(), rec);
        }
        SequenceUniverse { records }
    }

    pub fn from_path(p: &Path) -> anyhow::Result<SequenceUniverse> {
        require_file(p)?;
        let list = read_fasta_records(p)?;
        log::info!("Loaded {} sequences from {}", list.len(), p.display());
        Ok(SequenceUniverse::from_records(list))
    }

    pub fn get(&self, id: &str) -> Option<&SequenceRecord> {
        self.records.get(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
