//! Source-line map (C11): the address → source-line correspondence that
//! `break`/`del break` key into and that the call-stack tracker uses to
//! label each frame's current line.
//!
//! Grounded on `original_source/src/simulator.cpp::loadProgram`'s
//! `lineNumbers` vector built alongside `machineCode`.

use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
pub struct SourceMap {
    pc_to_line: HashMap<u64, usize>,
}

impl SourceMap {
    pub fn new(pc_to_line: HashMap<u64, usize>) -> Self {
        Self { pc_to_line }
    }

    pub fn line_for(&self, pc: u64) -> Option<usize> {
        self.pc_to_line.get(&pc).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looks_up_known_and_unknown_addresses() {
        let mut map = HashMap::new();
        map.insert(0u64, 2);
        map.insert(4u64, 3);
        let source_map = SourceMap::new(map);
        assert_eq!(source_map.line_for(0), Some(2));
        assert_eq!(source_map.line_for(4), Some(3));
        assert_eq!(source_map.line_for(8), None);
    }
}
