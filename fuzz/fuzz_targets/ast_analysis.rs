#![no_main]

use fluxwindow::ast::Node;
use fluxwindow::window::min_duration_from_ast_at;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Convert arbitrary bytes to UTF-8 string (lossy conversion)
    if let Ok(input) = std::str::from_utf8(data) {
        // Any tree the decoder accepts must analyze without panicking
        if let Ok(ast) = Node::from_json(input) {
            let _ = min_duration_from_ast_at(&ast, 1_700_000_000_000.0);
        }
    }
});
