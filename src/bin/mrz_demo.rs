use admitcheck::processing::MrzParser;
use admitcheck::utils::PipelineError;

fn main() -> Result<(), PipelineError> {
    println!("MRZ Decoder Demo");
    println!("----------------");

    let mrz = "P<UTOERIKSSON<<ANNA<MARIA<<<<<<<<<<<<<<<<<<<\n\
               L898902C36UTO7408122F1204159ZE184226B<<<<<10";

    println!("\nInput:\n{}\n", mrz);

    let data = MrzParser::parse(mrz)?;
    println!("DECODED FIELDS:");
    println!("  Document Type:   {}", data.document_type);
    println!("  Surname:         {}", data.surname);
    println!("  Given Names:     {}", data.given_names);
    println!("  Passport Number: {}", data.passport_number);
    println!("  Nationality:     {}", data.nationality);
    println!("  Date of Birth:   {} (YYMMDD)", data.date_of_birth);
    println!("  Sex:             {}", data.sex);
    println!("  Expiry Date:     {} (YYMMDD)", data.expiry_date);

    let lines: Vec<&str> = mrz.lines().collect();
    let issues = MrzParser::verify_check_digits(lines[1]);
    if issues.is_empty() {
        println!("\nAll check digits verified.");
    } else {
        println!("\nCHECK DIGIT ISSUES:");
        for issue in &issues {
            println!("  - {}", issue);
        }
    }

    Ok(())
}
