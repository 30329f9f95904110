use caret_core::{
    Direction, EditorIntent, EditorSession, HighlightScheduler, LineIndex, LoadOptions,
    LoadedFile, PlainTokenizer, TextDocument,
};
use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use std::sync::Arc;

fn large_text(line_count: usize) -> String {
    let mut out = String::with_capacity(line_count * 64);
    for i in 0..line_count {
        out.push_str(&format!(
            "{i:06} the quick brown fox jumps over the lazy dog (caret benchmark line)\n"
        ));
    }
    out.pop();
    out
}

fn loaded_session(text: &str) -> EditorSession {
    let mut session = EditorSession::default();
    session.load(Ok(LoadedFile::new(text, "plain")), LoadOptions::new());
    session.wait_for_highlight();
    session
}

fn bench_line_index_rebuild(c: &mut Criterion) {
    let text = large_text(50_000);
    let mut index = LineIndex::new();
    c.bench_function("line_index_rebuild/50k_lines", |b| {
        b.iter(|| {
            index.rebuild(black_box(text.as_bytes()));
            black_box(index.line_count());
        })
    });
}

fn bench_typing_in_middle(c: &mut Criterion) {
    let text = large_text(10_000);
    c.bench_function("typing_middle/100_inserts", |b| {
        b.iter_batched(
            || {
                let mut session = loaded_session(&text);
                session.handle(EditorIntent::JumpToLine(5_000));
                session
            },
            |mut session| {
                for _ in 0..100 {
                    session.handle(EditorIntent::InsertText("x".to_string()));
                }
                session.wait_for_highlight();
                black_box(session.text().len());
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_cursor_movement(c: &mut Criterion) {
    let text = large_text(10_000);
    let mut session = loaded_session(&text);
    c.bench_function("cursor_movement/word_right_1000", |b| {
        b.iter(|| {
            session.handle(EditorIntent::Move {
                direction: Direction::DocumentStart,
                extend: false,
            });
            for _ in 0..1000 {
                session.handle(EditorIntent::Move {
                    direction: Direction::WordRight,
                    extend: false,
                });
            }
            black_box(session.cursor().cursor_pos);
        })
    });
}

fn bench_highlight_request(c: &mut Criterion) {
    let text = large_text(10_000);
    let doc = TextDocument::from_bytes(text.into_bytes());
    let tokenizer = Arc::new(PlainTokenizer::default());
    let mut scheduler = HighlightScheduler::default();
    c.bench_function("highlight/plain_full_document", |b| {
        b.iter(|| {
            scheduler
                .request(&doc, 0..doc.len(), "plain", tokenizer.clone())
                .ok();
            black_box(scheduler.wait_idle());
        })
    });
}

fn bench_undo_snapshots(c: &mut Criterion) {
    let text = large_text(10_000);
    c.bench_function("undo/50_edits_then_undo_all", |b| {
        b.iter_batched(
            || loaded_session(&text),
            |mut session| {
                for _ in 0..50 {
                    session.handle(EditorIntent::InsertText("y".to_string()));
                }
                while session.handle(EditorIntent::Undo).is_some() {}
                black_box(session.text().len());
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    bench_line_index_rebuild,
    bench_typing_in_middle,
    bench_cursor_movement,
    bench_highlight_request,
    bench_undo_snapshots
);
criterion_main!(benches);
