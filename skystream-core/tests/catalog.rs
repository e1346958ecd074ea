//! End-to-end exercise of the core pieces together: a table described
//! with WCS columns, per-row transforms, computed corner columns and
//! IPAC table io.

use skystream_core::{ipac, Column, IpacReader, Row, ScaleColumns, Table, Value, WcsColumns};

fn image_table() -> Table {
    let mut columns = vec![
        Column::new("expid").principal(),
        Column::new("ctype1").constant(Value::Str("RA---TAN".into())),
        Column::new("ctype2").constant(Value::Str("DEC--TAN".into())),
        Column::new("cdelt1").constant(Value::Float(-2.75e-4)),
        Column::new("cdelt2").constant(Value::Float(2.75e-4)),
    ];
    for n in ["naxis1", "naxis2", "crpix1", "crpix2", "crval1", "crval2"] {
        columns.push(Column::new(n).unqueryable());
    }
    Table::new("test.images", columns)
        .unwrap()
        .with_wcs(WcsColumns {
            ctype1: "ctype1".into(),
            ctype2: "ctype2".into(),
            naxis1: "naxis1".into(),
            naxis2: "naxis2".into(),
            crpix1: "crpix1".into(),
            crpix2: "crpix2".into(),
            crval1: "crval1".into(),
            crval2: "crval2".into(),
            scale: ScaleColumns::CdeltRot {
                cdelt1: "cdelt1".into(),
                cdelt2: "cdelt2".into(),
                crota2: None,
            },
        })
        .unwrap()
        .with_corners(0.05)
        .unwrap()
        .with_center()
        .unwrap()
}

fn image_row(crval: (f64, f64)) -> Row {
    let mut row = Row::default();
    row.insert("expid".to_owned(), Value::Str("e001".to_owned()));
    for (k, v) in [
        ("naxis1", 256.0),
        ("naxis2", 256.0),
        ("crpix1", 128.5),
        ("crpix2", 128.5),
        ("crval1", crval.0),
        ("crval2", crval.1),
    ] {
        row.insert(k.to_owned(), Value::Float(v));
    }
    row
}

#[test]
fn transform_round_trips_inside_the_image() {
    let table = image_table();
    let wcs = table.make_wcs(&image_row((150.0, -12.0))).unwrap();
    let (x, y) = wcs.sky_to_pixel(150.01, -12.01).unwrap();
    assert!(wcs.interior(x, y));
    let (theta, phi) = wcs.pixel_to_sky(x, y);
    assert!((theta - 150.01).abs() < 1e-9);
    assert!((phi + 12.01).abs() < 1e-9);
}

#[test]
fn computed_corners_surround_the_center() {
    let table = image_table();
    let row = image_row((150.0, -12.0));
    let computed = table.compute_row(&row, None).unwrap();
    // 4 corner pairs plus the center pair
    assert_eq!(computed.len(), 10);
    let ra = computed["ra"].as_f64().unwrap();
    let dec = computed["dec"].as_f64().unwrap();
    assert!((ra - 150.0).abs() < 1e-6);
    assert!((dec + 12.0).abs() < 1e-6);
    for i in 1..=4 {
        let cdec = computed[&format!("dec{i}")].as_f64().unwrap();
        assert!((cdec - dec).abs() > 0.01 && (cdec - dec).abs() < 0.05);
    }
}

#[test]
fn pos_file_round_trips_through_the_reader() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pos.tbl");
    ipac::write_pos_file(&path, 266.25, -29.0078).unwrap();

    let mut reader = IpacReader::open(&path).unwrap();
    let names: Vec<&str> = reader.columns().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["ra", "dec"]);
    let row = reader.next_row().unwrap().unwrap();
    assert_eq!(row["ra"], Value::Float(266.25));
    assert_eq!(row["dec"], Value::Float(-29.0078));
    assert!(reader.next_row().unwrap().is_none());
}
