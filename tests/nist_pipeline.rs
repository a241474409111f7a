//! Integration tests for the NIST normalization pipeline.

use approx::assert_relative_eq;
use nist_normalize::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

const AREA_TSV: &str = "\
Name\tPH-HC_1\tPH-HC_26\tPH-HC_5676\tPH-HC_blank\tNIST_1-100 (1)\tNIST_1-100 (2)\tNIST_5601-5700(4)\tComment
AcylCarnitine 10:0\t81884\t1000\t3000\t5\t20120\t500\t750\tx
AC 10:0 d3\t212434\t2000\t1500\t5\t211600\t1000\t500\tx
PC 16:0\t400\tN/A\t900\t5\t200\t100\t300\tx
PC 15:0 d7\t100\t100\t300\t5\t100\t0\t100\tx
LPC 18:1\t10\t10\t10\t5\t10\t10\t10\tx
";

const COMPOUND_TSV: &str = "\
Compound\tISTD\tConc. (nM)\tResponse factor
AcylCarnitine 10:0\tAC 10:0 d3\t90.029\t1
PC 16:0\tPC 15:0 d7\t50\t2
LPC 18:1\tLPC 18:1 d7\t\t
";

const SAMPLE_TSV: &str = "\
Sample\tNIST
PH-HC_1\tNIST_1-100 (1)
PH-HC_26\tNIST_1-100 (2)
PH-HC_5676\tNIST_5601-5700 (4)
PH-HC_blank\t
";

fn write_temp(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn load_inputs() -> (AreaTable, Vec<CompoundIndexRow>, Vec<SampleIndexRow>) {
    let area = write_temp(AREA_TSV);
    let compounds = write_temp(COMPOUND_TSV);
    let samples = write_temp(SAMPLE_TSV);
    (
        AreaTable::from_path(area.path(), &ColumnPrefixes::default()).unwrap(),
        load_compound_index(compounds.path()).unwrap(),
        load_sample_index(samples.path()).unwrap(),
    )
}

#[test_log::test]
fn test_reference_example_end_to_end() {
    let (area, compounds, samples) = load_inputs();
    let results = Pipeline::new().run(&area, &compounds, &samples).unwrap();

    let r = results.get("AcylCarnitine 10:0", "PH-HC_1").unwrap();
    assert_eq!(r.status, ResultStatus::Ok);
    assert_relative_eq!(r.raw_ratio.unwrap(), 81884.0 / 212434.0);
    assert_relative_eq!(r.reference_ratio.unwrap(), 20120.0 / 211600.0);
    assert_relative_eq!(r.normalized.unwrap(), (81884.0 / 212434.0) / (20120.0 / 211600.0));
    assert_relative_eq!(r.normalized.unwrap(), 4.0538, epsilon = 1e-3);
    assert_relative_eq!(
        r.concentration.unwrap(),
        (81884.0 / 212434.0) * 90.029 * 500.0,
        epsilon = 1e-9
    );
}

#[test_log::test]
fn test_every_pair_has_a_status() {
    let (area, compounds, samples) = load_inputs();
    let results = Pipeline::new().run(&area, &compounds, &samples).unwrap();

    // 3 compounds × 4 sample columns
    assert_eq!(results.len(), 12);
    let summary = results.summary();
    assert_eq!(summary.compounds, 3);
    assert_eq!(summary.samples, 4);
    assert_eq!(
        ResultStatus::ALL.iter().map(|s| summary.count(*s)).sum::<usize>(),
        summary.total
    );

    // N/A area in the sample column
    assert_eq!(results.get("PC 16:0", "PH-HC_26").unwrap().status, ResultStatus::MissingArea);
    assert_eq!(results.get("PC 16:0", "PH-HC_1").unwrap().status, ResultStatus::Ok);
    // LPC 18:1 d7 is not in the area table
    assert_eq!(results.get("LPC 18:1", "PH-HC_1").unwrap().status, ResultStatus::MissingIstd);
    // blank reference in the sample index
    assert_eq!(
        results.get("AcylCarnitine 10:0", "PH-HC_blank").unwrap().status,
        ResultStatus::MissingReference
    );
}

#[test_log::test]
fn test_zero_reference_istd_is_zero_division() {
    let (area, compounds, samples) = load_inputs();
    let results = Pipeline::new().run(&area, &compounds, &samples).unwrap();
    let r = results.get("PC 16:0", "PH-HC_5676").unwrap();
    assert_eq!(r.status, ResultStatus::Ok);

    let samples = vec![SampleIndexRow::new("PH-HC_1", Some("NIST_1-100 (2)"))];
    let results = Pipeline::new().run(&area, &compounds, &samples).unwrap();
    let r = results.get("PC 16:0", "PH-HC_1").unwrap();
    assert_eq!(r.status, ResultStatus::ZeroDivision);
    assert_eq!(r.normalized, None);
    assert!(r.raw_ratio.is_some());
}

#[test_log::test]
fn test_spacing_variant_resolved_in_run() {
    let (area, compounds, samples) = load_inputs();
    let results = Pipeline::new().run(&area, &compounds, &samples).unwrap();

    let r = results.get("AcylCarnitine 10:0", "PH-HC_5676").unwrap();
    assert_eq!(r.reference_column.as_deref(), Some("NIST_5601-5700(4)"));
    assert_relative_eq!(r.normalized.unwrap(), (3000.0 / 1500.0) / (750.0 / 500.0));
}

#[test_log::test]
fn test_diagnostics_report_every_failure() {
    let (area, compounds, samples) = load_inputs();
    let results = Pipeline::new().run(&area, &compounds, &samples).unwrap();
    let d = &results.diagnostics;

    assert_eq!(d.compounds_total, 3);
    assert_eq!(d.compounds_resolved, 2);
    assert_eq!(d.samples_total, 4);
    assert_eq!(d.samples_resolved, 3);
    assert!(d.entries.contains(&LookupError::MissingIstdRow {
        compound: "LPC 18:1".into(),
        istd: "LPC 18:1 d7".into(),
    }));
    assert!(d.entries.contains(&LookupError::MissingReferenceAssignment {
        sample: "PH-HC_blank".into(),
    }));
}

#[test_log::test]
fn test_positional_matches_explicit() {
    let (area, compounds, samples) = load_inputs();
    let explicit = Pipeline::new().run(&area, &compounds, &samples).unwrap();
    let positional = Pipeline::new().positional().run(&area, &compounds, &[]).unwrap();

    for sample in ["PH-HC_1", "PH-HC_26", "PH-HC_5676"] {
        let a = explicit.get("AcylCarnitine 10:0", sample).unwrap();
        let b = positional.get("AcylCarnitine 10:0", sample).unwrap();
        assert_eq!(a.reference_column, b.reference_column, "sample {}", sample);
        assert_eq!(a.normalized, b.normalized, "sample {}", sample);
    }
    assert!(positional.diagnostics.entries.contains(&LookupError::NonNumericSample {
        sample: "PH-HC_blank".into(),
    }));
}

#[test_log::test]
fn test_verification_harness() {
    let (area, compounds, samples) = load_inputs();
    let pipeline = Pipeline::new();
    let results = pipeline.run(&area, &compounds, &samples).unwrap();

    let expected_file = write_temp(&format!(
        "compound\treference_column\texpected\n\
         AcylCarnitine 10:0\tNIST_1-100(1)\t{}\n\
         PC 16:0\tNIST_1-100 (1)\t9.99\n\
         PC 16:0\tNIST_1-100 (2)\t1.0\n",
        20120.0 / 211600.0
    ));
    let expected = load_expected(expected_file.path()).unwrap();
    let report = pipeline.verify(&results, &expected);

    let ac = report.get("AcylCarnitine 10:0", "NIST_1-100(1)").unwrap();
    assert_eq!(ac.verdict, Verdict::Pass);
    assert_eq!(report.get("PC 16:0", "NIST_1-100 (1)").unwrap().verdict, Verdict::Fail);
    // ISTD area 0 in that replicate: nothing to compare
    assert_eq!(report.get("PC 16:0", "NIST_1-100 (2)").unwrap().verdict, Verdict::Missing);
    assert_eq!(report.passed(), 1);
}

#[test_log::test]
fn test_run_normalization_from_paths_and_export() {
    let area = write_temp(AREA_TSV);
    let compounds = write_temp(COMPOUND_TSV);
    let samples = write_temp(SAMPLE_TSV);
    let config = NormalizationConfig {
        max_compounds_detailed: Some(1),
        ..Default::default()
    };

    let results =
        run_normalization(area.path(), compounds.path(), Some(samples.path()), &config).unwrap();
    assert_eq!(results.details.len(), 4);
    assert!(results.details.iter().all(|d| d.compound == "AcylCarnitine 10:0"));

    let text = String::from_utf8(export(&results, &ExportOptions::default()).unwrap()).unwrap();
    assert_eq!(text.lines().count(), 13);
    assert!(!text.contains("NaN"));
    assert!(text.contains("AcylCarnitine 10:0\tAC 10:0 d3\tPH-HC_1\t0.385456\tNIST_1-100 (1)\t0.095085\t4.053"));

    let matrix = String::from_utf8(export(&results, &ExportOptions::matrix()).unwrap()).unwrap();
    let header = matrix.lines().next().unwrap();
    assert_eq!(header, "compound\tPH-HC_1\tPH-HC_26\tPH-HC_5676\tPH-HC_blank");

    let refs = String::from_utf8(export_reference_ratios(&results, &ExportOptions::default()).unwrap())
        .unwrap();
    assert!(refs.starts_with("compound\tistd\tNIST_1-100 (1)\tNIST_1-100 (2)\tNIST_5601-5700(4)"));

    let json: serde_json::Value = serde_json::from_str(&results.to_json().unwrap()).unwrap();
    assert_eq!(json["records"].as_array().unwrap().len(), 12);
    assert_eq!(json["diagnostics"]["compounds_resolved"], 2);
}

#[test]
fn test_conflicting_index_is_fatal() {
    let (area, _, samples) = load_inputs();
    let compounds = vec![
        CompoundIndexRow::new("PC 16:0", "PC 15:0 d7"),
        CompoundIndexRow::new("PC 16:0", "AC 10:0 d3"),
    ];
    match Pipeline::new().run(&area, &compounds, &samples).unwrap_err() {
        NormError::Configuration(e) => assert_eq!(e.issues.len(), 1),
        other => panic!("unexpected error: {other}"),
    }
}
