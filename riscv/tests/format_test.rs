use simrv_riscv::{decode, decode_word, format, UNKNOWN_MNEMONIC};

#[test]
fn test_format_decoded_fixtures() {
    let cases: [([u8; 4], &str); 4] = [
        ([0x37, 0xcc, 0x03, 0x00], "lui x24, 0x3c"),
        ([0x6f, 0x00, 0x80, 0x03], "jal x0, 0x38"),
        ([0xe3, 0xc6, 0x62, 0xfc], "blt x5, x6, 0xffffffffffffffcc"),
        ([0x63, 0x05, 0x03, 0x00], "beq x6, x0, 0xa"),
    ];
    for (bytes, text) in cases {
        let (inst, _) = decode(&bytes, 0);
        assert_eq!(format(&inst), text);
    }
}

#[test]
fn test_format_templates() {
    // sub x1, x2, x3
    assert_eq!(format(&decode_word(0x403100b3, 0)), "sub x1, x2, x3");
    // lw x5, 8(x2)
    assert_eq!(format(&decode_word(0x00812283, 0)), "lw x5, x2, 0x8");
    // sd x3, -8(x2)
    assert_eq!(format(&decode_word(0xfe313c23, 0)), "sd x2, x3, 0xfffffffffffffff8");
    // auipc x1, 0x1
    assert_eq!(format(&decode_word(0x00001097, 0)), "auipc x1, 0x1000");
}

#[test]
fn test_format_display_matches() {
    let inst = decode_word(0x00100093, 0);
    assert_eq!(inst.to_string(), format(&inst));
    assert_eq!(inst.to_string(), "addi x1, x0, 0x1");
}

#[test]
fn test_format_unknown_sentinel() {
    let (compressed, _) = decode(&[0x85, 0x00], 0);
    assert_eq!(format(&compressed), UNKNOWN_MNEMONIC);

    // jalr with funct3 = 1 keeps its operands but prints as unknown
    assert_eq!(format(&decode_word(0x000110e7, 0)), UNKNOWN_MNEMONIC);
}
