use super::LirType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructLayout {
    pub size: u64,
    pub align: u32,
    pub field_offsets: Vec<u64>,
}

/// Size in bytes. Integers round up to whole bytes; a bare `Named` type is
/// unsized.
pub fn size_of(ty: &LirType) -> u64 {
    match ty {
        LirType::Int(bits) => int_bytes(*bits),
        LirType::Half => 2,
        LirType::F32 => 4,
        LirType::F64 => 8,
        LirType::F128 => 16,
        LirType::Ptr(_) | LirType::Function { .. } => 8,
        LirType::Array(elem, len) => size_of(elem) * len,
        LirType::Struct { .. } => struct_layout(ty).map(|layout| layout.size).unwrap_or(0),
        LirType::Named(_) | LirType::Void => 0,
    }
}

pub fn align_of(ty: &LirType) -> u32 {
    match ty {
        LirType::Int(bits) => int_bytes(*bits).clamp(1, 16).next_power_of_two() as u32,
        LirType::Half => 2,
        LirType::F32 => 4,
        LirType::F64 => 8,
        LirType::F128 => 16,
        LirType::Ptr(_) | LirType::Function { .. } => 8,
        LirType::Array(elem, _) => align_of(elem),
        LirType::Struct { .. } => struct_layout(ty).map(|layout| layout.align).unwrap_or(1),
        LirType::Named(_) | LirType::Void => 1,
    }
}

fn int_bytes(bits: u32) -> u64 {
    (bits as u64).div_ceil(8)
}

pub fn struct_layout(ty: &LirType) -> Option<StructLayout> {
    let LirType::Struct { fields, packed, .. } = ty else {
        return None;
    };

    let mut offsets = Vec::with_capacity(fields.len());
    let mut offset = 0u64;
    let mut max_align = 1u32;

    for field in fields {
        let field_align = if *packed { 1 } else { align_of(field) };
        max_align = max_align.max(field_align);
        offset = align_to(offset, field_align as u64);
        offsets.push(offset);
        offset = offset.saturating_add(size_of(field));
    }

    let align = if *packed { 1 } else { max_align };
    Some(StructLayout {
        size: align_to(offset, align as u64),
        align,
        field_offsets: offsets,
    })
}

fn align_to(value: u64, alignment: u64) -> u64 {
    if alignment <= 1 {
        return value;
    }
    value.div_ceil(alignment) * alignment
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn struct_fields_are_aligned() {
        let ty = LirType::Struct {
            name: Some("S".to_string()),
            fields: vec![
                LirType::Int(8),
                LirType::Int(32),
                LirType::ptr(LirType::Named("S".into())),
            ],
            packed: false,
        };
        let layout = struct_layout(&ty).unwrap();
        assert_eq!(layout.field_offsets, vec![0, 4, 8]);
        assert_eq!(layout.size, 16);
        assert_eq!(layout.align, 8);
    }

    #[test]
    fn odd_integer_widths_round_up() {
        assert_eq!(size_of(&LirType::Int(17)), 3);
        assert_eq!(align_of(&LirType::Int(17)), 4);
        assert_eq!(size_of(&LirType::Int(1)), 1);
    }
}
