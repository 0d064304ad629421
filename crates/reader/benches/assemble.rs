//! Full reader assembly on generated pages
//!
//! Run with: cargo bench -p termview --bench assemble

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use termview::{Document, LocalSurface, Reader, StaticGeometry, Surface};

/// Page with site chrome, `sections` article sections and a link-heavy sidebar
fn generate_page(sections: usize) -> String {
    let mut html = String::from(
        "<html><head><title>Bench | Site</title>\
         <meta name=\"author\" content=\"Bench Writer\"></head><body>\
         <header><nav><a href=\"/\">Home</a><a href=\"/world\">World</a></nav></header>\
         <h1>Generated article</h1><div class=\"layout\"><div class=\"story\">",
    );

    for i in 0..sections {
        html.push_str(&format!("<h2>Section {i}</h2>"));
        for j in 0..4 {
            html.push_str(&format!(
                "<p>Paragraph {j} of section {i} with <a href=\"/ref/{i}/{j}\">a reference</a> \
                 and enough prose to look like real copy in a long-form article.</p>"
            ));
        }
        html.push_str(&format!("<img src=\"/img/{i}.jpg\" alt=\"figure {i}\">"));
        html.push_str("<div class=\"sr-only\"><p>Skip to next section</p></div>");
    }

    html.push_str("</div><aside class=\"sidebar\">");
    for i in 0..sections * 3 {
        html.push_str(&format!("<a href=\"/related/{i}\">Related {i}</a>"));
    }
    html.push_str("</aside></div><footer><p>Copyright</p></footer></body></html>");
    html
}

fn bench_assemble(c: &mut Criterion) {
    let reader = Reader::new().unwrap();
    let mut group = c.benchmark_group("assemble");

    for sections in [4, 32, 128] {
        let doc = Document::from_html(&generate_page(sections)).unwrap();
        let mut geometry = StaticGeometry::new();
        for id in doc.arena().find_by_tag("div") {
            geometry.set_box(id, 800.0, 1200.0);
        }
        for id in doc.arena().find_by_tag("img") {
            geometry.set_box(id, 640.0, 360.0).set_natural(id, 1280.0, 720.0);
        }

        group.bench_with_input(BenchmarkId::new("extract", sections), &doc, |b, doc| {
            b.iter(|| black_box(reader.extract(doc, &geometry)))
        });

        group.bench_with_input(BenchmarkId::new("assemble_and_render", sections), &doc, |b, doc| {
            b.iter(|| {
                let surface = LocalSurface::new();
                let html = reader
                    .assemble(doc, &geometry, &surface)
                    .into_document()
                    .map(|out| out.to_html());
                surface.release();
                black_box(html)
            })
        });
    }

    group.finish();
}

fn bench_parse(c: &mut Criterion) {
    let html = generate_page(64);
    c.bench_function("document_from_html", |b| {
        b.iter(|| black_box(Document::from_html(black_box(&html)).unwrap()))
    });
}

criterion_group!(benches, bench_assemble, bench_parse);
criterion_main!(benches);
