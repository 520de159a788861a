#![cfg(feature = "rayon")]

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use simmatch::{
    MemoryCollection, ScanBudget, ScanOptions, SearchConfig, SimMatchError, SimilaritySearch,
};
use std::io::Cursor;

fn png(shift: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(60, 40, |x, y| {
        let v = ((x * 4 + y * 2 + shift * 13) % 256) as u8;
        Rgb([v, 255 - v, ((x / 10 + y / 10 + shift) % 2 * 200) as u8])
    });
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

fn collection() -> MemoryCollection {
    let mut coll = MemoryCollection::new();
    for i in 0..24u32 {
        coll.insert(format!("img-{i:02}.png"), png(i % 7));
    }
    coll.insert("broken-1.png", b"nope".to_vec());
    coll.insert("broken-2.png", Vec::new());
    coll
}

fn engine(parallel: bool, budget: ScanBudget) -> SimilaritySearch {
    SimilaritySearch::new(SearchConfig {
        scan: ScanOptions { parallel, budget },
        ..SearchConfig::default()
    })
    .unwrap()
}

#[test]
fn parallel_scan_matches_sequential_scan() {
    let coll = collection();
    let query = png(3);
    for threshold in [-1.0, 0.2, 0.9] {
        let seq = engine(false, ScanBudget::unlimited())
            .find_similar(&query, threshold, &coll, Some("img-10.png"))
            .unwrap();
        let par = engine(true, ScanBudget::unlimited())
            .find_similar(&query, threshold, &coll, Some("img-10.png"))
            .unwrap();
        assert_eq!(seq, par);
    }
}

#[test]
fn parallel_scan_honors_item_budget() {
    let coll = collection();
    let budget = ScanBudget {
        max_items: Some(5),
        deadline: None,
    };
    let seq = engine(false, budget)
        .find_similar(&png(0), 0.0, &coll, None)
        .unwrap();
    let par = engine(true, budget)
        .find_similar(&png(0), 0.0, &coll, None)
        .unwrap();
    assert_eq!(seq, par);
    assert_eq!(par.stats.visited, 5);
    assert!(par.stats.truncated);
}

#[test]
fn parallel_scan_still_rejects_bad_threshold() {
    let err = engine(true, ScanBudget::unlimited())
        .find_similar(&png(0), -2.0, &collection(), None)
        .unwrap_err();
    assert_eq!(err, SimMatchError::InvalidThreshold { value: -2.0 });
}
