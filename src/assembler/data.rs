//! Data loader (C8): write scanned `.byte`/`.half`/`.word`/`.dword` items
//! into memory, little-endian, at their already-computed addresses.
//!
//! Grounded on `original_source/src/simulator.cpp::loadDataSection`.

use super::labels::DataItem;
use crate::memory::{Memory, MemoryFault};

pub fn load_data(items: &[DataItem], mem: &mut Memory) -> Result<(), MemoryFault> {
    for item in items {
        match item.width {
            1 => mem.write8(item.address, item.value as u8)?,
            2 => mem.write16(item.address, item.value as u16)?,
            4 => mem.write32(item.address, item.value as u32)?,
            8 => mem.write64(item.address, item.value as u64)?,
            other => unreachable!("data directive width must be 1/2/4/8, got {other}"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_each_item_at_its_address() {
        let mut mem = Memory::new();
        let items = vec![
            DataItem { address: 0x10000, width: 1, value: 72 },
            DataItem { address: 0x10001, width: 1, value: 101 },
            DataItem { address: 0x10008, width: 4, value: 0x1234 },
        ];
        load_data(&items, &mut mem).unwrap();
        assert_eq!(mem.read8(0x10000).unwrap(), 72);
        assert_eq!(mem.read8(0x10001).unwrap(), 101);
        assert_eq!(mem.read32(0x10008).unwrap(), 0x1234);
    }

    #[test]
    fn negative_values_wrap_to_unsigned_bit_pattern() {
        let mut mem = Memory::new();
        let items = vec![DataItem { address: 0x10000, width: 1, value: -1 }];
        load_data(&items, &mut mem).unwrap();
        assert_eq!(mem.read8(0x10000).unwrap(), 0xFF);
    }
}
