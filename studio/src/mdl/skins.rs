//! Skin family table, and culling it down to the materials meshes draw with.
//!
//! studiomdl pads the family table with columns no mesh uses, so the used set
//! is found by walking mstudiobodyparts_t -> mstudiomodel_t -> mstudiomesh_t.

use std::{collections::BTreeSet, io, mem};

use super::{
    error::{MdlError, TableContext},
    headers::{mstudiobodyparts_t, mstudiomesh_t, mstudiomodel_t},
};
use crate::binaries::{invalid_data, BinArray, BinaryData, TrackedCursor};

/// Every `material` index referenced by a mesh, in ascending order.
pub(crate) fn used_materials(
    buffer: &mut TrackedCursor,
    bodyparts: &BinArray,
) -> Result<BTreeSet<usize>, MdlError> {
    let mut used = BTreeSet::new();

    let parts: Vec<(u64, mstudiobodyparts_t)> =
        bodyparts.read_table(buffer, 0).table("body parts")?;

    for (part_start, part) in &parts {
        let models: Vec<(u64, mstudiomodel_t)> =
            part.models().read_table(buffer, *part_start).table("body part models")?;

        for (model_start, model) in &models {
            let meshes: Vec<(u64, mstudiomesh_t)> =
                model.meshes.read_table(buffer, *model_start).table("meshes")?;

            for (_, mesh) in &meshes {
                let material = mesh.material;
                match usize::try_from(material) {
                    Ok(material) => {
                        used.insert(material);
                    }
                    Err(_) => log::warn!("mesh uses negative material {}", material),
                }
            }
        }
    }

    log::debug!(
        "{} body parts reference {} materials",
        parts.len(),
        used.len()
    );
    Ok(used)
}

/// Read the `families x references` grid of texture indices.
///
/// Every family counts as at least one entry against the bytes left.
pub(crate) fn read_skin_families(
    buffer: &mut TrackedCursor,
    families: usize,
    references: usize,
) -> Result<Vec<Vec<u16>>, MdlError> {
    let remaining = buffer.len().saturating_sub(buffer.position());
    let needed = families
        .checked_mul(references.max(1))
        .and_then(|n| n.checked_mul(mem::size_of::<u16>()));
    if !matches!(needed, Some(n) if n as u64 <= remaining) {
        return Err(MdlError::Table {
            table: "skin families",
            source: invalid_data(format!(
                "{families} skin families of {references} entries overrun the file"
            )),
        });
    }

    let mut grid = Vec::with_capacity(families.min(4096));
    for _ in 0..families {
        let row = (0..references)
            .map(|_| u16::read(buffer))
            .collect::<io::Result<Vec<u16>>>()
            .table("skin families")?;
        grid.push(row);
    }
    Ok(grid)
}

/// Keep only the columns of each skin that a mesh actually draws with.
pub(crate) fn cull_skins(skins: &mut [Vec<String>], used: &BTreeSet<usize>) {
    for skin in skins.iter_mut() {
        *skin = used
            .iter()
            .filter_map(|&column| skin.get(column).cloned())
            .collect();
    }
}
