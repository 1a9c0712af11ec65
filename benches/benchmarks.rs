//! Benchmarks for the codec and the paginator

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use folio::{
    codec, AttributeSet, Font, FontLibrary, Footnote, FootnoteDirectory, FootnoteStyle,
    PageSetup, PaginatedLayout, StyledText,
};
use std::sync::Arc;

fn manuscript(paragraphs: usize) -> StyledText {
    let mut text = StyledText::default();
    for i in 0..paragraphs {
        text.push(
            &format!("Paragraph {i} carries enough prose to wrap across several lines of a page. "),
            AttributeSet::body(),
        );
        text.push(
            "Some of it is emphasised",
            AttributeSet::body().with_font(Font::resolve("Georgia", 16.0, false, true)),
        );
        text.push(".\n", AttributeSet::body());
    }
    text
}

fn bench_encode(c: &mut Criterion) {
    let text = manuscript(200);
    c.bench_function("encode_attributes", |b| {
        b.iter(|| black_box(codec::encode(black_box(&text))));
    });
}

fn bench_decode(c: &mut Criterion) {
    let text = manuscript(200);
    let bytes = codec::encode(&text);
    c.bench_function("decode_attributes", |b| {
        b.iter(|| black_box(codec::decode(black_box(&bytes), text.text())));
    });
}

fn bench_rtf_round_trip(c: &mut Criterion) {
    let text = manuscript(50);
    c.bench_function("rtf_round_trip", |b| {
        b.iter(|| black_box(codec::validate_round_trip(black_box(&text))));
    });
}

fn bench_layout_simple(c: &mut Criterion) {
    let fonts = Arc::new(FontLibrary::default());
    let text = manuscript(300);
    c.bench_function("layout_without_footnotes", |b| {
        let mut layout = PaginatedLayout::new(text.clone(), PageSetup::default(), Arc::clone(&fonts));
        b.iter(|| {
            layout.invalidate();
            black_box(layout.calculate_layout(None).ok());
        });
    });
}

fn bench_layout_footnotes(c: &mut Criterion) {
    let fonts = Arc::new(FontLibrary::default());
    let text = manuscript(300);
    let footnotes: Vec<Footnote> = (0..60)
        .map(|i| {
            Footnote::new(
                i * text.len() / 60,
                i as u32 + 1,
                "A footnote citing a source, with a page number and a short remark.",
            )
        })
        .collect();
    let directory = FootnoteDirectory::new(footnotes, FootnoteStyle::default(), Arc::clone(&fonts));

    c.bench_function("layout_with_footnotes", |b| {
        let mut layout = PaginatedLayout::new(text.clone(), PageSetup::default(), Arc::clone(&fonts));
        b.iter(|| {
            layout.invalidate();
            black_box(layout.calculate_layout(Some(&directory)).ok());
        });
    });
}

criterion_group!(
    benches,
    bench_encode,
    bench_decode,
    bench_rtf_round_trip,
    bench_layout_simple,
    bench_layout_footnotes,
);

criterion_main!(benches);
