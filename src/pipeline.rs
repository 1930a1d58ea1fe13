//! Conversion driver: walks a source step by step and streams consolidated
//! geometry and fields into a sink through the writer protocol.
//!
//! Two flows exist. The timestep flow iterates the source's steps, emitting
//! geometry for every basis updated at that step and then all fields updated
//! at that step. The eigenmode flow replaces it when the source exposes mode
//! shapes: one output step per mode, tagged with the mode's eigenvalue or
//! frequency, geometry pinned to level 0.

use std::sync::Arc;

use log::{debug, info};

use crate::data::cache::{PatchCache, PatchKey};
use crate::data::patch::Patch;
use crate::io::protocol::Protocol;
use crate::io::sink::Sink;
use crate::io::source::Source;
use crate::io::{BasisInfo, FieldInfo, StepMeta};
use crate::mesh_error::MeshTesselateError;
use crate::topology::manager::GeometryManager;

/// Run one full conversion, consuming `sink` and returning it when the
/// source is exhausted.
///
/// # Errors
/// Propagates source read errors, sink write errors and every invariant
/// violation from the layers below; the run is single-shot and nothing is
/// retried.
pub fn convert<Src: Source, S: Sink>(
    source: &mut Src,
    sink: S,
) -> Result<S, MeshTesselateError> {
    let bases = source.bases()?;
    let mut cache = PatchCache::new();

    let pardim = max_pardim(source, &bases, &mut cache)?;
    info!("conversion start: {} bases, max pardim {pardim}", bases.len());
    let mut protocol = Protocol::new(sink, GeometryManager::new(pardim));

    let modes = source.eigenmode_fields()?;
    if modes.is_empty() {
        timestep_flow(source, &bases, &mut cache, &mut protocol)?;
    } else {
        eigenmode_flow(source, &bases, &modes, &mut cache, &mut protocol)?;
    }
    Ok(protocol.into_sink())
}

/// Largest parametric dimension over the first patch of every basis. The
/// catalogue is sized to it; patches beyond it are unrepresentable.
fn max_pardim<Src: Source>(
    source: &mut Src,
    bases: &[BasisInfo],
    cache: &mut PatchCache,
) -> Result<usize, MeshTesselateError> {
    let mut pardim = 0;
    for basis in bases {
        let Some(&level) = basis.updates.first() else {
            continue;
        };
        if source.num_patches(level, &basis.name)? == 0 {
            continue;
        }
        let patch = fetch(source, cache, level, &basis.name, 0)?;
        pardim = pardim.max(patch.pardim());
    }
    if pardim == 0 {
        return Err(MeshTesselateError::InvalidShape(
            "source exposes no patches".into(),
        ));
    }
    Ok(pardim)
}

fn timestep_flow<Src: Source, S: Sink>(
    source: &mut Src,
    bases: &[BasisInfo],
    cache: &mut PatchCache,
    protocol: &mut Protocol<S>,
) -> Result<(), MeshTesselateError> {
    let steps = source.steps()?;
    let fields = source.fields()?;

    for (step, &meta) in steps.iter().enumerate() {
        protocol.begin_step(meta)?;

        for basis in bases {
            if !basis.updates.contains(&step) {
                continue;
            }
            debug!("geometry update for basis {} at step {step}", basis.name);
            let npatches = source.num_patches(step, &basis.name)?;
            for index in 0..npatches {
                let patch = fetch(source, cache, step, &basis.name, index)?;
                protocol.update_geometry(&patch, step)?;
            }
        }
        protocol.finalize_geometry()?;

        for name in source.fields_at(step)? {
            let Some(field) = fields.iter().find(|f| f.name == name) else {
                return Err(MeshTesselateError::External(format!(
                    "source updated undeclared field {name}"
                )));
            };
            update_field(source, bases, cache, protocol, field, step)?;
        }
        protocol.finalize_step()?;
    }
    Ok(())
}

/// Stream every patch of one field at one step.
fn update_field<Src: Source, S: Sink>(
    source: &mut Src,
    bases: &[BasisInfo],
    cache: &mut PatchCache,
    protocol: &mut Protocol<S>,
    field: &FieldInfo,
    step: usize,
) -> Result<(), MeshTesselateError> {
    let basis = basis_of(bases, field)?;
    let level = basis.level_at(step)?;
    let npatches = source.num_patches(level, &basis.name)?;
    for index in 0..npatches {
        let patch = fetch(source, cache, level, &basis.name, index)?;
        let coeffs = source.field_coeffs(field, step, index)?;
        protocol.update_field(field, &patch, &coeffs)?;
    }
    Ok(())
}

fn eigenmode_flow<Src: Source, S: Sink>(
    source: &mut Src,
    bases: &[BasisInfo],
    modes: &[FieldInfo],
    cache: &mut PatchCache,
    protocol: &mut Protocol<S>,
) -> Result<(), MeshTesselateError> {
    // All mode shapes share one basis and one geometry level.
    let Some(field) = modes.first() else {
        return Ok(());
    };
    let basis = basis_of(bases, field)?;
    let level = basis.level_at(0)?;
    let npatches = source.num_patches(level, &basis.name)?;
    let nmodes = source.num_modes(&basis.name)?;
    info!("eigenmode flow: {nmodes} modes on {npatches} patches");

    for mode in 0..nmodes {
        let mut per_patch = Vec::with_capacity(npatches);
        let mut meta: Option<StepMeta> = None;
        for index in 0..npatches {
            let (coeffs, tag) = source.mode_coeffs(field, mode, index)?;
            meta.get_or_insert(tag);
            per_patch.push(coeffs);
        }
        let meta = meta.ok_or_else(|| {
            MeshTesselateError::External(format!("mode {mode} has no patches"))
        })?;

        protocol.begin_step(meta)?;
        for index in 0..npatches {
            let patch = fetch(source, cache, level, &basis.name, index)?;
            protocol.update_geometry(&patch, level)?;
        }
        protocol.finalize_geometry()?;
        for (index, coeffs) in per_patch.iter().enumerate() {
            let patch = fetch(source, cache, level, &basis.name, index)?;
            protocol.update_field(field, &patch, coeffs)?;
        }
        protocol.finalize_step()?;
    }
    Ok(())
}

fn basis_of<'a>(
    bases: &'a [BasisInfo],
    field: &FieldInfo,
) -> Result<&'a BasisInfo, MeshTesselateError> {
    bases.iter().find(|b| b.name == field.basis).ok_or_else(|| {
        MeshTesselateError::External(format!(
            "field {} references undeclared basis {}",
            field.name, field.basis
        ))
    })
}

fn fetch<Src: Source>(
    source: &mut Src,
    cache: &mut PatchCache,
    step: usize,
    basis: &str,
    index: usize,
) -> Result<Arc<Patch>, MeshTesselateError> {
    let key = PatchKey {
        step,
        basis: basis.to_string(),
        index,
    };
    if let Some(hit) = cache.get(&key) {
        return Ok(hit);
    }
    let patch = source.patch(step, basis, index)?;
    Ok(cache.insert(key, patch))
}
