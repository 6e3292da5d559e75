use ppm_import::config::{Config, UploadConfig};
use ppm_import::core::ids::{FixedClock, IdGenerator};
use ppm_import::core::record::{Frequency, TaskRecord, TaskType};
use ppm_import::import::{ImportOptions, import_workbook};
use ppm_import::output::html::UploadPage;
use ppm_import::output::json;
use ppm_import::sheet::Workbook;
use rand::SeedableRng as _;
use rand::rngs::StdRng;
use time::macros::date;

fn write_csv(dir: &std::path::Path, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).expect("write csv");
    path
}

#[test]
fn csv_to_json_and_upload_page() {
    let td = tempfile::tempdir().expect("tempdir");
    let input = write_csv(
        td.path(),
        "tasks.csv",
        "Task Description,Shift\n\
         PPM for Fire Extinguisher at Building A - Monthly Inspection,Day\n\
         ,Night\n\
         Weekly cleaning of break room,Both\n\
         Annual calibrate gas detectors,Day\n",
    );

    let cfg = Config::default();
    let workbook = Workbook::open(&input).expect("open");
    let mut opts = ImportOptions::from_config(&cfg, date!(2024 - 01 - 01));
    opts.stagger_window = 30;
    let mut ids = IdGenerator::new(FixedClock(1_704_067_200_000), StdRng::seed_from_u64(11));
    let report = import_workbook(&workbook, &cfg.classifier.build(), &opts, &mut ids);

    assert_eq!(report.total(), 3);
    assert_eq!(report.sheets[0].name, "tasks");
    assert_eq!(report.sheets[0].skipped, 1);

    let fire = &report.records[0];
    assert_eq!(fire.frequency, Frequency::Monthly);
    assert_eq!(fire.task_type, TaskType::Inspection);
    assert_eq!(fire.due_date, date!(2024 - 01 - 01));
    assert_eq!(report.classifications[0].equipment, "Fire Extinguisher");

    let break_room = &report.records[1];
    assert_eq!(break_room.frequency, Frequency::Weekly);
    assert_eq!(break_room.task_type, TaskType::Cleaning);
    assert_eq!(break_room.due_date, date!(2024 - 01 - 08));
    assert_eq!(report.classifications[1].location, "");

    let gas = &report.records[2];
    assert_eq!(gas.frequency, Frequency::Yearly);
    assert_eq!(gas.task_type, TaskType::Testing);
    assert_eq!(gas.due_date, date!(2025 - 12 - 31));

    for (pos, r) in report.records.iter().enumerate() {
        let floor = 1_704_067_200_000 + pos as i64;
        assert!((floor..=floor + 999).contains(&r.id));
    }

    let json_path = td.path().join("imported_ppm_tasks.json");
    json::write_pretty(&json_path, &report.records).expect("write json");
    let back: Vec<TaskRecord> = json::read_records(&json_path).expect("read json");
    assert_eq!(back, report.records);

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).expect("read")).expect("parse");
    assert_eq!(raw[0]["shiftType"], "Both");
    assert_eq!(raw[0]["status"], "Not Started");
    assert_eq!(raw[0]["dueDate"], "2024-01-01");
    assert!(raw[0]["lastCompleted"].is_null());

    let html_path = td.path().join("import_tasks.html");
    let upload = UploadConfig {
        batch_size: 5,
        ..UploadConfig::default()
    };
    UploadPage {
        upload: &upload,
        source_name: &workbook.file_name(),
        records: &report.records,
    }
    .write(&html_path)
    .expect("write html");
    let html = std::fs::read_to_string(&html_path).expect("read html");
    assert!(html.contains("Source:</strong> tasks.csv"));
    assert!(html.contains("const BATCH_SIZE = 5;"));
    assert!(html.contains("Weekly cleaning of break room"));
}

#[test]
fn thirty_five_rows_wrap_the_stagger_window() {
    let td = tempfile::tempdir().expect("tempdir");
    let mut body = String::from("Task\n");
    for i in 0..35 {
        body.push_str(&format!("Daily check of unit {i}\n"));
    }
    let input = write_csv(td.path(), "daily.csv", &body);

    let cfg = Config::default();
    let workbook = Workbook::open(&input).expect("open");
    let opts = ImportOptions::from_config(&cfg, date!(2024 - 01 - 01));
    let mut ids = IdGenerator::new(FixedClock(0), StdRng::seed_from_u64(5));
    let report = import_workbook(&workbook, &cfg.classifier.build(), &opts, &mut ids);

    assert_eq!(report.total(), 35);
    assert_eq!(report.records[29].due_date, date!(2024 - 01 - 30));
    assert_eq!(report.records[30].due_date, report.records[0].due_date);
    assert_eq!(report.records[34].due_date, date!(2024 - 01 - 05));
}

#[test]
fn unreadable_input_fails_before_any_output() {
    let td = tempfile::tempdir().expect("tempdir");
    let input = write_csv(td.path(), "tasks.xlsx", "definitely not a workbook");
    assert!(Workbook::open(&input).is_err());
    let entries: Vec<_> = std::fs::read_dir(td.path()).expect("read_dir").collect();
    assert_eq!(entries.len(), 1);
}

#[test]
fn ids_are_unique_and_increasing_across_a_large_import() {
    let td = tempfile::tempdir().expect("tempdir");
    let mut body = String::from("Task\n");
    for i in 0..320 {
        body.push_str(&format!("PPM for Luminaire {i} at Level {}\n", i % 7));
        if i % 50 == 0 {
            body.push_str(",\n");
        }
    }
    let input = write_csv(td.path(), "lighting.csv", &body);

    let cfg = Config::default();
    let workbook = Workbook::open(&input).expect("open");
    let opts = ImportOptions::from_config(&cfg, date!(2024 - 01 - 01));
    let classifier = cfg.classifier.build();

    let check = |ids: &[i64]| {
        assert_eq!(ids.len(), 320);
        assert!(ids.windows(2).all(|w| w[1] == w[0] + 1), "ids must step by one");
    };

    for seed in 0..5 {
        let mut id_gen = IdGenerator::new(FixedClock(1_704_067_200_000), StdRng::seed_from_u64(seed));
        let report = import_workbook(&workbook, &classifier, &opts, &mut id_gen);
        let ids: Vec<i64> = report.records.iter().map(|r| r.id).collect();
        check(&ids);
    }

    let mut id_gen = IdGenerator::system();
    let report = import_workbook(&workbook, &classifier, &opts, &mut id_gen);
    let ids: Vec<i64> = report.records.iter().map(|r| r.id).collect();
    check(&ids);
}
