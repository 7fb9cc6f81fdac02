use meja_core::event::SheetEvent;
use meja_core::io::{CsvOptions, CsvReader, CsvWriter, HtmlWriter, MarkdownWriter, read_file, write_file};
use meja_core::{CellValue, Locale, RectangularRegion, SearchOptions, SearchSettings, Workbook};
use parking_lot::Mutex;
use std::sync::Arc;

fn sample() -> Workbook {
    let mut workbook = Workbook::new(Locale::Root);
    let sheet = workbook.create_sheet("Data").unwrap();
    {
        let mut s = sheet.write();
        s.create_row(["name", "qty"]).unwrap();
        s.create_row([CellValue::from("apple"), CellValue::from(3)]).unwrap();
        s.create_row([CellValue::from("pear"), CellValue::from(1.5)]).unwrap();
    }
    workbook
}

#[test]
fn test_csv_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fruit.csv");
    let workbook = sample();
    write_file(&CsvWriter::default(), &workbook, &path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text, "name,qty\napple,3\npear,1.5\n\n");

    let read = read_file(&CsvReader::default(), &path).unwrap();
    assert_eq!(read.location(), Some(path.as_path()));
    let sheet = read.sheet(0).unwrap().read();
    assert_eq!(sheet.name(), "fruit");
    assert_eq!(sheet.cell(1, 1).unwrap().number().unwrap(), 3.0);
    assert_eq!(sheet.cell(2, 0).unwrap().text().unwrap(), "pear");
}

#[test]
fn test_german_csv_uses_semicolon() {
    let options = CsvOptions {
        separator: None,
        locale: Locale::Germany,
        ..CsvOptions::default()
    };
    let mut input = "Wert;Menge\n1.234,5;7\n".as_bytes();
    let workbook = meja_core::io::WorkbookReader::read(&CsvReader::new(options), &mut input, "de").unwrap();
    let sheet = workbook.sheet(0).unwrap().read();
    assert_eq!(sheet.cell(1, 0).unwrap().number().unwrap(), 1234.5);
    assert_eq!(sheet.display(1, 0), "1234,5");
}

#[test]
fn test_events_reach_subscribers() {
    let workbook = sample();
    let handle = workbook.sheet(0).unwrap().clone();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    handle.subscribe(move |event: &SheetEvent| sink.lock().push(event.clone()));

    handle.update(|s| {
        s.set(0, 0, "label").unwrap();
        s.add_merged_region("A1:B1".parse::<RectangularRegion>().unwrap())
            .unwrap();
    });

    let events = seen.lock();
    assert!(events.iter().any(|e| matches!(
        e,
        SheetEvent::CellValueChanged { new: CellValue::Text(t), .. } if t == "label"
    )));
    assert!(events.iter().any(|e| matches!(e, SheetEvent::LayoutChanged)));
}

#[test]
fn test_search_then_export() {
    let workbook = sample();
    let handle = workbook.sheet(0).unwrap();
    let settings = SearchSettings::of(&[SearchOptions::IgnoreCase, SearchOptions::UpdateCurrentCellWhenFound]);
    let found = handle.write().find_and_update("PEAR", &settings);
    assert_eq!(found.map(|c| c.to_string()), Some("A3".to_string()));
    assert_eq!(handle.read().current_cell(), found);

    let html = HtmlWriter::default().render(&workbook);
    assert!(html.contains("<td"));
    assert!(html.contains(">pear<"));

    let mut md = Vec::new();
    meja_core::io::WorkbookWriter::write(&MarkdownWriter, &workbook, &mut md).unwrap();
    let md = String::from_utf8(md).unwrap();
    assert!(md.starts_with("# Data\n"));
    assert!(md.contains("| 3 | pear | 1.5 |"));
}
