use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};

use restable::construct::ResName;
use restable::datatype::{ResourceKind, SourceLocation, TypedResource};
use restable::matcher::pick_best_qualifier;
use restable::table::{PackageResourceTable, ResourceTable};

const LOCALES: [&str; 8] = ["", "en", "en-rGB", "en-rUS", "de", "fr", "ja", "zh-rTW"];
const VERSIONS: [&str; 4] = ["", "v21", "v26", "v30"];

fn qualifier_strings() -> Vec<String> {
    let mut strings = Vec::new();
    for locale in LOCALES {
        for version in VERSIONS {
            let joined = [locale, version].iter().filter(|s| !s.is_empty()).cloned().collect::<Vec<_>>().join("-");
            strings.push(joined);
        }
    }
    strings.sort();
    strings
}

fn table(names: usize) -> PackageResourceTable {
    let mut table = PackageResourceTable::new("com.example");
    let source = SourceLocation::new("com.example", "values/strings.json");
    for n in 0..names {
        let name = format!("string_{}", n);
        for qualifiers in qualifier_strings() {
            let value = format!("{} [{}]", name, qualifiers);
            table
                .add_value("string", &name, TypedResource::text(ResourceKind::CharSequence, value, qualifiers, source.clone()))
                .unwrap();
        }
    }
    table.generate_missing_ids(0x7f).unwrap();
    table.seal();
    table
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let strings = qualifier_strings();
    c.bench_function("match 32 variants", |b| {
        b.iter(|| pick_best_qualifier(black_box("en-rUS-land-xhdpi-v28"), &strings))
    });
    c.bench_function("match unqualified", |b| b.iter(|| pick_best_qualifier(black_box(""), &strings)));

    let table = table(1000);
    let name = ResName::new("com.example", "string", "string_500");
    c.bench_function("lookup by name 1k", |b| {
        b.iter(|| table.get_value(black_box(&name), "de-rAT-v29"))
    });
    let id = table.get_resource_id(&name).unwrap();
    c.bench_function("lookup by id 1k", |b| b.iter(|| table.get_value_by_id(black_box(id), "ja")));
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
