use mesh_tesselate::algs::tesselate::Elements;
use mesh_tesselate::prelude::*;

/// Records everything the pipeline pushes through the protocol.
#[derive(Default)]
struct RecordingSink {
    steps: Vec<(usize, StepMeta)>,
    geometry: Vec<(usize, usize, usize)>, // (patch id, nodes, cells)
    fields: Vec<(usize, String, usize, Vec<f64>, ValueKind, bool)>, // keyed by output step
    finalized: usize,
}

impl Sink for RecordingSink {
    fn begin_step(&mut self, step: usize, meta: StepMeta) -> Result<(), MeshTesselateError> {
        self.steps.push((step, meta));
        Ok(())
    }

    fn geometry(
        &mut self,
        patch_id: usize,
        nodes: &[[f64; 3]],
        elements: &Elements,
    ) -> Result<(), MeshTesselateError> {
        self.geometry
            .push((patch_id, nodes.len(), elements.num_cells()));
        Ok(())
    }

    fn field(
        &mut self,
        name: &str,
        patch_id: usize,
        values: &[f64],
        kind: ValueKind,
        cells: bool,
    ) -> Result<(), MeshTesselateError> {
        let step = self.steps.len() - 1;
        self.fields
            .push((step, name.into(), patch_id, values.to_vec(), kind, cells));
        Ok(())
    }

    fn finalize_step(&mut self) -> Result<(), MeshTesselateError> {
        self.finalized += 1;
        Ok(())
    }
}

fn run<S: Source>(mut source: S) -> Result<RecordingSink, MeshTesselateError> {
    convert(&mut source, RecordingSink::default())
}

fn square_at(x0: f64) -> Patch {
    let b = BSplineBasis::linear(&[0.0, 1.0]).unwrap();
    Patch::new(
        vec![b.clone(), b],
        vec![
            x0, 0.0, //
            x0 + 1.0, 0.0,
            x0, 1.0,
            x0 + 1.0, 1.0,
        ],
        2,
        false,
    )
    .unwrap()
}

/// Two-patch, two-step source: geometry updated at step 0 only, a nodal
/// temperature at both steps, a per-cell energy at step 1 only.
struct TimeSource;

impl Source for TimeSource {
    fn steps(&mut self) -> Result<Vec<StepMeta>, MeshTesselateError> {
        Ok(vec![StepMeta::Time(0.0), StepMeta::Time(0.5)])
    }

    fn bases(&mut self) -> Result<Vec<BasisInfo>, MeshTesselateError> {
        Ok(vec![BasisInfo {
            name: "geometry".into(),
            updates: vec![0],
        }])
    }

    fn fields(&mut self) -> Result<Vec<FieldInfo>, MeshTesselateError> {
        Ok(vec![
            FieldInfo {
                name: "temperature".into(),
                basis: "geometry".into(),
                ncomps: 1,
                kind: FieldKind::Point,
            },
            FieldInfo {
                name: "energy".into(),
                basis: "geometry".into(),
                ncomps: 1,
                kind: FieldKind::Cell,
            },
        ])
    }

    fn fields_at(&mut self, step: usize) -> Result<Vec<String>, MeshTesselateError> {
        Ok(match step {
            0 => vec!["temperature".into()],
            _ => vec!["temperature".into(), "energy".into()],
        })
    }

    fn num_patches(&mut self, _step: usize, _basis: &str) -> Result<usize, MeshTesselateError> {
        Ok(2)
    }

    fn patch(
        &mut self,
        _step: usize,
        _basis: &str,
        index: usize,
    ) -> Result<Patch, MeshTesselateError> {
        Ok(square_at(index as f64 * 2.0))
    }

    fn field_coeffs(
        &mut self,
        field: &FieldInfo,
        step: usize,
        index: usize,
    ) -> Result<Vec<f64>, MeshTesselateError> {
        let base = step as f64 * 100.0 + index as f64 * 10.0;
        Ok(match field.kind {
            FieldKind::Cell => vec![base],
            _ => vec![base, base + 1.0, base + 2.0, base + 3.0],
        })
    }
}

#[test]
fn timestep_flow_streams_geometry_once_and_fields_per_step() {
    let sink = run(TimeSource).unwrap();

    // Two output steps with their source tags.
    assert_eq!(
        sink.steps,
        vec![(0, StepMeta::Time(0.0)), (1, StepMeta::Time(0.5))]
    );
    assert_eq!(sink.finalized, 2);

    // Geometry: two distinct patches, emitted during step 0 only.
    assert_eq!(sink.geometry, vec![(0, 4, 1), (1, 4, 1)]);

    // Step 0: temperature on both patches. Step 1: temperature + energy.
    let at = |step: usize, name: &str| {
        sink.fields
            .iter()
            .filter(|f| f.0 == step && f.1 == name)
            .collect::<Vec<_>>()
    };
    assert_eq!(at(0, "temperature").len(), 2);
    assert_eq!(at(1, "temperature").len(), 2);
    assert_eq!(at(0, "energy").len(), 0);

    let energy = at(1, "energy");
    assert_eq!(energy.len(), 2);
    for f in &energy {
        assert!(f.5, "cell fields carry the cells flag");
        assert_eq!(f.3.len(), 1, "one value per cell");
        assert_eq!(f.4, ValueKind::Scalar);
    }

    // Nodal values arrive in node order, untouched for identity patches.
    let t0 = &at(0, "temperature")[0].3;
    assert_eq!(t0, &vec![0.0, 1.0, 2.0, 3.0]);
}

/// One-patch modal source: two mode shapes tagged with frequencies.
struct ModeSource;

impl Source for ModeSource {
    fn steps(&mut self) -> Result<Vec<StepMeta>, MeshTesselateError> {
        Ok(Vec::new())
    }

    fn bases(&mut self) -> Result<Vec<BasisInfo>, MeshTesselateError> {
        Ok(vec![BasisInfo {
            name: "geometry".into(),
            updates: vec![0],
        }])
    }

    fn fields(&mut self) -> Result<Vec<FieldInfo>, MeshTesselateError> {
        Ok(Vec::new())
    }

    fn fields_at(&mut self, _step: usize) -> Result<Vec<String>, MeshTesselateError> {
        Ok(Vec::new())
    }

    fn eigenmode_fields(&mut self) -> Result<Vec<FieldInfo>, MeshTesselateError> {
        Ok(vec![FieldInfo {
            name: "mode shape".into(),
            basis: "geometry".into(),
            ncomps: 1,
            kind: FieldKind::Eigenmode,
        }])
    }

    fn num_modes(&mut self, _basis: &str) -> Result<usize, MeshTesselateError> {
        Ok(2)
    }

    fn num_patches(&mut self, _step: usize, _basis: &str) -> Result<usize, MeshTesselateError> {
        Ok(1)
    }

    fn patch(
        &mut self,
        _step: usize,
        _basis: &str,
        _index: usize,
    ) -> Result<Patch, MeshTesselateError> {
        Ok(square_at(0.0))
    }

    fn field_coeffs(
        &mut self,
        _field: &FieldInfo,
        _step: usize,
        _index: usize,
    ) -> Result<Vec<f64>, MeshTesselateError> {
        Err(MeshTesselateError::External("modal run".into()))
    }

    fn mode_coeffs(
        &mut self,
        _field: &FieldInfo,
        mode: usize,
        _index: usize,
    ) -> Result<(Vec<f64>, StepMeta), MeshTesselateError> {
        let amp = (mode + 1) as f64;
        Ok((
            vec![0.0, amp, 0.0, amp],
            StepMeta::Frequency(10.0 * (mode + 1) as f64),
        ))
    }
}

#[test]
fn eigenmode_flow_writes_one_step_per_mode() {
    let sink = run(ModeSource).unwrap();

    assert_eq!(
        sink.steps,
        vec![
            (0, StepMeta::Frequency(10.0)),
            (1, StepMeta::Frequency(20.0))
        ]
    );
    // Geometry appears once, with the first mode.
    assert_eq!(sink.geometry, vec![(0, 4, 1)]);

    // Mode shapes are vectorized: scalar amplitude in the third channel.
    assert_eq!(sink.fields.len(), 2);
    for (step, f) in sink.fields.iter().enumerate() {
        assert_eq!(f.0, step);
        assert_eq!(f.1, "mode shape");
        assert_eq!(f.4, ValueKind::Vector);
        assert_eq!(f.3.len(), 12);
        let amp = (step + 1) as f64;
        assert_eq!(f.3[2], 0.0);
        assert_eq!(f.3[5], amp);
        assert_eq!(f.3[8], 0.0);
        assert_eq!(f.3[11], amp);
    }
}
