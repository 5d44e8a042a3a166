//! Element type table and face connectivity.

/// Solid, spring and mass elements the translator can carry over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    /// 4-node tetrahedron (C3D4)
    Tet4,
    /// 10-node tetrahedron (C3D10)
    Tet10,
    /// 10-node modified tetrahedron (C3D10M)
    Tet10M,
    /// 6-node wedge (C3D6)
    Wedge6,
    /// 15-node wedge (C3D15)
    Wedge15,
    /// 8-node brick, full or reduced integration (C3D8, C3D8R)
    Hex8,
    /// 8-node brick with incompatible modes (C3D8I)
    Hex8I,
    /// 8-node hybrid brick (C3D8H)
    Hex8H,
    /// 20-node brick (C3D20)
    Hex20,
    /// Spring to ground or axial spring (SPRING1, SPRINGA)
    Spring,
    /// Point mass; carried through ingestion, never written
    Mass,
}

const TET4_FACES: &[&[usize]] = &[&[0, 1, 2], &[0, 1, 3], &[1, 2, 3], &[2, 0, 3]];

const WEDGE6_FACES: &[&[usize]] = &[
    &[0, 1, 2],
    &[3, 4, 5],
    &[0, 1, 4, 3],
    &[1, 2, 5, 4],
    &[2, 0, 3, 5],
];

const HEX8_FACES: &[&[usize]] = &[
    &[0, 1, 2, 3],
    &[4, 5, 6, 7],
    &[0, 1, 5, 4],
    &[1, 2, 6, 5],
    &[2, 3, 7, 6],
    &[3, 0, 4, 7],
];

const TET10_FACES: &[&[usize]] = &[
    &[0, 6, 1, 4, 2, 5],
    &[0, 6, 1, 8, 3, 7],
    &[1, 4, 2, 9, 3, 8],
    &[2, 5, 0, 9, 3, 7],
];

const WEDGE15_FACES: &[&[usize]] = &[
    &[0, 8, 1, 6, 2, 7],
    &[3, 11, 4, 9, 5, 10],
    &[0, 8, 1, 13, 4, 11, 3],
    &[1, 6, 2, 14, 5, 9, 4],
    &[2, 7, 0, 12, 3, 10, 5],
];

const HEX20_FACES: &[&[usize]] = &[
    &[0, 8, 1, 9, 2, 10, 3, 11],
    &[4, 12, 5, 13, 6, 14, 7, 15],
    &[0, 8, 1, 17, 5, 12, 4, 16],
    &[1, 9, 2, 18, 6, 13, 5, 17],
    &[2, 10, 3, 19, 7, 14, 6, 18],
    &[3, 11, 0, 16, 4, 15, 7, 19],
];

impl ElementType {
    /// Looks up an Abaqus element name, case-insensitively.
    pub fn from_abaqus(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "C3D4" => Some(ElementType::Tet4),
            "C3D10" => Some(ElementType::Tet10),
            "C3D10M" => Some(ElementType::Tet10M),
            "C3D6" => Some(ElementType::Wedge6),
            "C3D15" => Some(ElementType::Wedge15),
            "C3D8" | "C3D8R" => Some(ElementType::Hex8),
            "C3D8I" => Some(ElementType::Hex8I),
            "C3D8H" => Some(ElementType::Hex8H),
            "C3D20" => Some(ElementType::Hex20),
            "SPRING1" | "SPRINGA" => Some(ElementType::Spring),
            "MASS" => Some(ElementType::Mass),
            _ => None,
        }
    }

    /// FrontISTR element type code.
    pub fn code(self) -> u32 {
        match self {
            ElementType::Tet4 => 341,
            ElementType::Tet10 => 342,
            ElementType::Tet10M => 3423,
            ElementType::Wedge6 => 351,
            ElementType::Wedge15 => 352,
            ElementType::Hex8 => 361,
            ElementType::Hex8I => 3612,
            ElementType::Hex8H => 3614,
            ElementType::Hex20 => 362,
            ElementType::Spring => 111,
            ElementType::Mass => 999,
        }
    }

    /// Quadratic tetrahedra whose mid-edge nodes are numbered differently by
    /// the two solvers.
    pub fn needs_tet10_renumbering(self) -> bool {
        matches!(self, ElementType::Tet10 | ElementType::Tet10M)
    }

    /// Ordered faces as 0-based local node indices.
    pub fn faces(self) -> &'static [&'static [usize]] {
        match self {
            ElementType::Tet4 => TET4_FACES,
            ElementType::Tet10 | ElementType::Tet10M => TET10_FACES,
            ElementType::Wedge6 => WEDGE6_FACES,
            ElementType::Wedge15 => WEDGE15_FACES,
            ElementType::Hex8 | ElementType::Hex8I | ElementType::Hex8H => HEX8_FACES,
            ElementType::Hex20 => HEX20_FACES,
            ElementType::Spring | ElementType::Mass => &[],
        }
    }

    /// Local node indices of the 1-based face number (`S1`, `S2`, ...).
    pub fn face_nodes(self, face: usize) -> Option<&'static [usize]> {
        face.checked_sub(1).and_then(|i| self.faces().get(i).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_names_to_codes() {
        assert_eq!(ElementType::from_abaqus("c3d8r").map(ElementType::code), Some(361));
        assert_eq!(ElementType::from_abaqus("C3D10M").map(ElementType::code), Some(3423));
        assert_eq!(ElementType::from_abaqus("SpringA").map(ElementType::code), Some(111));
        assert_eq!(ElementType::from_abaqus("S4R"), None);
    }

    #[test]
    fn face_lookup_is_one_based() {
        assert_eq!(ElementType::Tet4.face_nodes(1), Some(&[0, 1, 2][..]));
        assert_eq!(ElementType::Tet4.face_nodes(4), Some(&[2, 0, 3][..]));
        assert_eq!(ElementType::Tet4.face_nodes(0), None);
        assert_eq!(ElementType::Tet4.face_nodes(5), None);
        assert_eq!(ElementType::Hex8I.faces().len(), 6);
        assert!(ElementType::Spring.faces().is_empty());
    }

    #[test]
    fn face_indices_stay_within_node_count() {
        let cases = [
            (ElementType::Tet4, 4),
            (ElementType::Tet10, 10),
            (ElementType::Wedge6, 6),
            (ElementType::Wedge15, 15),
            (ElementType::Hex8, 8),
            (ElementType::Hex20, 20),
        ];
        for (ty, nodes) in cases {
            for face in ty.faces() {
                assert!(face.iter().all(|&i| i < nodes), "{ty:?}");
            }
        }
    }
}
