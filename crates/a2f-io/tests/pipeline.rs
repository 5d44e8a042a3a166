//! Deck text in, FrontISTR artifacts out.

use a2f_io::{ConvertOptions, IoError, convert};
use a2f_model::ConvertError;
use std::fs;
use std::path::PathBuf;

fn fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("../../tests/fixtures/decks");
    path.push(name);
    fs::read_to_string(&path).expect("fixture should be readable")
}

#[test]
fn single_tetrahedron_static_job() {
    let job = convert(&fixture("tet_static.inp"), &ConvertOptions::default()).expect("convert");

    assert!(job.mesh.starts_with("!NODE\n      1,  0.0,  0.0,  0.0\n"));
    assert!(job.mesh.contains("!ELEMENT, TYPE=341, EGRP=EALL\n      1, 1, 2, 3, 4\n"));
    assert!(job.mesh.contains("!NGROUP, NGRP=FIXED\n"));
    assert!(job.mesh.contains("!NGROUP, NGRP=TIP\n"));
    assert!(!job.mesh.contains("NGRP=NALL"));
    assert!(job.mesh.contains("!MATERIAL, NAME=STEEL, ITEM=2\n"));
    assert!(job.mesh.contains("!SECTION, TYPE=SOLID, EGRP=EALL, MATERIAL=STEEL\n1.0\n"));

    assert!(job.control.contains("!SOLUTION, TYPE=STATIC\n"));
    assert!(job.control.contains("!BOUNDARY, GRPID=1\nFIXED, 1, 6\n"));
    assert!(job.control.contains("!CLOAD, GRPID=1\nTIP, 3, -100.\n"));
    assert!(job.control.contains("!STEP, SUBSTEPS=1\nBOUNDARY,1\nLOAD,1\n"));
    assert!(job.control.contains("!VTK_OUTPUT_CONTROL\nDISP,ON\nREAC,ON\nSTRAIN,ON\nSTRESS,ON\n"));
    assert!(job.control.ends_with("!END\n"));

    assert!(job.job.contains("model.msh\n"));
    assert_eq!(job.partition, None);
}

#[test]
fn contact_job_is_nonlinear_with_derived_slave_group() {
    let mut options = ConvertOptions::default();
    options.job_name = "stack".into();
    let job = convert(&fixture("hex_contact.inp"), &options).expect("convert");

    assert!(job.mesh.contains("!NGROUP, NGRP=SLAVE_SURF_NGRP_\n 5, 6, 7, 8,\n"));
    assert!(job.mesh.contains("!SGROUP, SGRP=MASTER_SURF\n2,1,\n"));
    assert!(job.mesh.contains("!NGROUP, NGRP=BASE, GENERATE\n1, 4, 1\n"));
    assert!(job.mesh.contains("!CONTACT PAIR, NAME=CP1\nSLAVE_SURF_NGRP_, MASTER_SURF\n"));

    assert!(job.control.contains("!SOLUTION, TYPE=NLSTATIC\n!CONTACT_ALGO,TYPE=ALAGRANGE\n"));
    assert!(job.control.contains("!CONTACT, INTERACTION=SSLID, GRPID=1\nCP1, 0.2, 1.0E+3\n"));
    assert!(job.control.contains("!PLASTIC, YIELD=MISES, HARDEN=MULTILINEAR\n"));
    assert!(job.control.contains(
        "!STEP, SUBSTEPS=1, OUTFREQ=1, MAXITER=50\nBOUNDARY,1\nBOUNDARY,2\nCONTACT,1\n"
    ));
    assert!(job.job.contains("!CONTROL,NAME=fstrCNT\nstack.cnt\n"));
}

#[test]
fn rigid_link_elements_follow_the_largest_element() {
    let deck = "\
*NODE
1, 1., 0., 0.
2, 0., 1., 0.
3, 0., 0., 1.
100, 0., 0., 0.
*ELEMENT, TYPE=C3D4, ELSET=E
5, 1, 2, 3, 100
*NSET, NSET=HUB
100
*NSET, NSET=RIM
1, 2
*MPC
BEAM, RIM, HUB
*BOUNDARY
HUB, 1, 2
HUB, 4, 6
*STEP
*STATIC
*CLOAD
HUB, 3, 50.
*END STEP
";
    let job = convert(deck, &ConvertOptions::default()).expect("convert");
    assert!(job.mesh.contains("!ELEMENT, TYPE=111, EGRP=ROTATIONLINK\n      6, 100, 1\n      7, 100, 2\n"));
    assert!(job.control.contains("!RIGIDLINK, DOF=6\n 100, 1\n 100, 2\n"));
    assert!(job.control.contains("!CLOAD, GRPID=1\n100, 1, 50.\n"));
}

#[test]
fn failures_produce_no_job() {
    let err = convert("*MATERIAL, NAME=M\n*DRUCKER PRAGER\n30., 1., 30.\n", &ConvertOptions::default())
        .expect_err("no FrontISTR equivalent");
    assert!(matches!(err, IoError::Convert(ConvertError::Unsupported { .. })));
}

#[test]
fn distributed_job_writes_partition_descriptor() {
    let mut options = ConvertOptions::default();
    options.distributed.enabled = true;
    options.distributed.domains = 4;
    let job = convert(&fixture("tet_static.inp"), &options).expect("convert");
    assert!(job.control.contains("!SOLVER,METHOD=CG,"));

    let dir = tempfile::tempdir().expect("temp dir");
    let paths = job.write_to_dir(dir.path().join("out")).expect("write");
    assert_eq!(paths.len(), 4);
    let partition = fs::read_to_string(dir.path().join("out/hecmw_part_ctrl.dat")).expect("read");
    assert_eq!(partition, "!PARTITION,TYPE=NODE-BASED,METHOD=PMETIS,DOMAIN=4\n");
    let mesh = fs::read_to_string(dir.path().join("out/model.msh")).expect("read");
    assert_eq!(mesh, job.mesh);
}
