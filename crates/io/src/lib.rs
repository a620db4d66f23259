use anyhow::{Context, Result};
use model::*;
use serde::{Deserialize, Serialize};
use std::{io::Read, path::Path};

/// Load a recorded run. Columns: `t_s,x,y,vx,vy,vz`, header required.
pub fn read_samples_csv(path: &Path) -> Result<Vec<Sample>> {
    let rdr = csv::Reader::from_path(path)
        .with_context(|| format!("open {}", path.display()))?;
    collect(rdr)
}

pub fn read_samples<R: Read>(reader: R) -> Result<Vec<Sample>> {
    collect(csv::Reader::from_reader(reader))
}

fn collect<R: Read>(mut rdr: csv::Reader<R>) -> Result<Vec<Sample>> {
    let mut out = Vec::new();
    for (i, rec) in rdr.deserialize().enumerate() {
        // +2: header line and 1-based numbering
        let r: CsvRow = rec.with_context(|| format!("row {}", i + 2))?;
        out.push(Sample::new(
            Position::new(r.x, r.y),
            Velocity::new(r.vx, r.vy, r.vz),
            r.t_s,
        ));
    }
    Ok(out)
}

#[derive(Serialize, Deserialize)]
struct CsvRow {
    t_s: f64,
    x: f64, y: f64,
    vx: f64, vy: f64, vz: f64,
}
