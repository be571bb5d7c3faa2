use super::SynonymCluster;

pub(super) const SYNONYM_CLUSTERS: &[SynonymCluster] = &[
    SynonymCluster {
        canonical: "áo",
        synonyms: &[
            "áo thun",
            "áo phông",
            "áo sơ mi",
            "áo khoác",
            "áo len",
            "áo polo",
            "áo croptop",
            "áo kiểu",
            "t-shirt",
            "shirt",
        ],
    },
    SynonymCluster {
        canonical: "quần",
        synonyms: &[
            "quần jean",
            "quần jeans",
            "quần tây",
            "quần âu",
            "quần short",
            "quần kaki",
            "quần ống rộng",
            "pants",
        ],
    },
    SynonymCluster {
        canonical: "váy",
        synonyms: &["chân váy", "váy liền", "đầm", "dress", "skirt"],
    },
    SynonymCluster {
        canonical: "đầm",
        synonyms: &["váy", "váy liền", "đầm dự tiệc", "đầm maxi", "dress"],
    },
    SynonymCluster {
        canonical: "giày",
        synonyms: &["sneaker", "giày thể thao", "giày cao gót", "boot", "sandal"],
    },
    SynonymCluster { canonical: "dép", synonyms: &["sandal", "dép lê", "dép quai hậu"] },
    SynonymCluster { canonical: "túi", synonyms: &["túi xách", "balo", "ba lô", "clutch", "bag"] },
    SynonymCluster { canonical: "balo", synonyms: &["ba lô", "túi", "backpack"] },
    SynonymCluster { canonical: "mũ", synonyms: &["nón", "mũ lưỡi trai", "nón kết", "cap", "hat"] },
    SynonymCluster { canonical: "nón", synonyms: &["mũ", "nón kết", "cap", "hat"] },
    SynonymCluster {
        canonical: "đồ bộ",
        synonyms: &["bộ đồ", "đồ ngủ", "pijama", "set đồ"],
    },
    SynonymCluster {
        canonical: "phụ kiện",
        synonyms: &["thắt lưng", "dây nịt", "khăn", "kính", "trang sức"],
    },
];
