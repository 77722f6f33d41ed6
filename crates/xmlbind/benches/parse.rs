use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use xmlbind::Document;

const SIMPLE_XML: &str = "<root><child>text</child></root>";
const ATTR_XML: &str = "<root id=\"1\" name='test'><item value=\"42\" /></root>";

fn catalog(items: usize) -> String {
    let mut xml = String::from("<?xml version=\"1.0\"?>\n<Catalog>\n");
    for i in 0..items {
        xml.push_str(&format!(
            "  <Item id=\"{i}\" kind=\"{}\"><Name>item {i}</Name><Price>{}.99</Price></Item>\n",
            if i % 2 == 0 { "even" } else { "odd" },
            i % 100
        ));
    }
    xml.push_str("</Catalog>\n");
    xml
}

fn bench_simple(c: &mut Criterion) {
    c.bench_function("xmlbind_parse_simple", |b| {
        b.iter(|| Document::parse(black_box(SIMPLE_XML)))
    });
}

fn bench_attr(c: &mut Criterion) {
    c.bench_function("xmlbind_parse_attr", |b| {
        b.iter(|| Document::parse(black_box(ATTR_XML)))
    });
}

fn bench_catalog(c: &mut Criterion) {
    let xml = catalog(1_000);
    c.bench_function("xmlbind_parse_catalog_1000", |b| {
        b.iter(|| Document::parse(black_box(&xml)))
    });
}

criterion_group!(benches, bench_simple, bench_attr, bench_catalog);
criterion_main!(benches);
